use blockshift_engine::library::{heading, lede, paragraph};
use blockshift_engine::{
    AttributeValue, Attributes, BlockInstance, BlockName, BlockRegistry, NodeList,
    SplitMergeEngine, TransformEngine, all_features, builtin_registry, parse_fragment,
};
use pretty_assertions::assert_eq;
use rstest::rstest;

fn registry() -> BlockRegistry {
    builtin_registry(&all_features).unwrap()
}

fn nodes(markup: &str) -> NodeList {
    NodeList::new(parse_fragment(markup).unwrap())
}

fn block(registry: &BlockRegistry, name: &str, extra: &[(&str, AttributeValue)]) -> BlockInstance {
    let mut attributes: Attributes = extra
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect();
    attributes
        .entry("content".into())
        .or_insert_with(|| nodes("Some <strong>bold</strong> &amp; <em>plain</em> text").into());
    registry.create_block(name, attributes).unwrap()
}

fn text(block: &BlockInstance) -> String {
    block
        .attribute("content")
        .and_then(AttributeValue::as_nodes)
        .map(NodeList::text)
        .unwrap_or_default()
}

#[rstest]
#[case::paragraph(paragraph::NAME, vec![])]
#[case::paragraph_aligned(paragraph::NAME, vec![("align", "center".into()), ("dropCap", true.into())])]
#[case::lede(lede::NAME, vec![])]
#[case::lede_drop_cap(lede::NAME, vec![("dropCap", true.into())])]
#[case::heading(heading::NAME, vec![])]
#[case::heading_h5(heading::NAME, vec![("nodeName", "H5".into()), ("anchor", "intro".into())])]
#[case::heading_aligned(heading::NAME, vec![("align", "right".into())])]
#[case::empty_lede(lede::NAME, vec![("content", NodeList::empty().into())])]
fn extract_inverts_serialize(#[case] name: &str, #[case] extra: Vec<(&str, AttributeValue)>) {
    let registry = registry();
    let original = block(&registry, name, &extra);

    let markup = registry.serialize(&original).unwrap();
    let extracted = registry.extract(name, &markup).unwrap();
    let detected = registry.parse_block(&markup).unwrap();

    assert_eq!(extracted.attributes(), original.attributes());
    assert_eq!(detected.name(), original.name());
    assert_eq!(detected.attributes(), original.attributes());
}

#[rstest]
#[case("ABCD")]
#[case("Some <strong>bold</strong> text")]
#[case("<em>a<strong>b</strong></em>c<br>d")]
#[case("héllo wörld")]
fn split_preserves_content(#[case] markup: &str) {
    let registry = registry();
    let engine = SplitMergeEngine::new(&registry);
    let content = nodes(markup);
    let original = block(&registry, paragraph::NAME, &[("content", content.clone().into())]);

    for offset in 0..=content.text_len() {
        let blocks = engine.split_at(&original, offset).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(format!("{}{}", text(&blocks[0]), text(&blocks[1])), content.text());

        let merged = engine.merge(&blocks[0], &blocks[1]).unwrap();
        assert_eq!(
            merged.block.attribute("content"),
            Some(&AttributeValue::Nodes(content.clone())),
            "offset {offset}"
        );
    }
}

#[rstest]
#[case(heading::NAME, lede::NAME)]
#[case(lede::NAME, heading::NAME)]
#[case(lede::NAME, paragraph::NAME)]
#[case(heading::NAME, paragraph::NAME)]
#[case(paragraph::NAME, heading::NAME)]
#[case(paragraph::NAME, lede::NAME)]
fn transforms_preserve_content(#[case] from: &str, #[case] to: &str) {
    let registry = registry();
    let engine = TransformEngine::new(&registry);
    let source = block(&registry, from, &[]);

    let blocks = engine.apply_transform(&source, to).unwrap();

    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].name(), &BlockName::from(to));
    assert_eq!(blocks[0].attribute("content"), source.attribute("content"));
}

#[test]
fn available_targets_are_deterministic_and_resolvable() {
    let registry = registry();
    let engine = TransformEngine::new(&registry);

    for name in [paragraph::NAME, lede::NAME, heading::NAME] {
        let source = block(&registry, name, &[]);
        let first = engine.available_targets(&source).unwrap();
        let second = engine.available_targets(&source).unwrap();
        assert_eq!(first, second);
        assert!(!first.is_empty(), "{name} should have targets");

        for target in &first {
            assert!(
                engine.apply_transform(&source, target.as_str()).is_ok(),
                "{name} -> {target} is listed but not resolvable"
            );
        }
    }
}

#[test]
fn available_targets_follow_registration_order() {
    let registry = registry();
    let engine = TransformEngine::new(&registry);
    let names = |name: &str| -> Vec<String> {
        engine
            .available_targets(&block(&registry, name, &[]))
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect()
    };

    assert_eq!(names(paragraph::NAME), vec![lede::NAME, heading::NAME]);
    assert_eq!(names(lede::NAME), vec![paragraph::NAME, heading::NAME]);
    assert_eq!(names(heading::NAME), vec![paragraph::NAME, lede::NAME]);
}

#[test]
fn explicit_rule_beats_pattern_rule() {
    let registry = registry();
    let engine = TransformEngine::new(&registry);
    let source = block(&registry, paragraph::NAME, &[("content", nodes("### Title").into())]);

    // Both paragraph -> heading and the heading marker pattern could apply.
    let blocks = engine.apply_transform(&source, heading::NAME).unwrap();

    assert_eq!(text(&blocks[0]), "### Title");
    assert_eq!(
        blocks[0].attribute("nodeName"),
        Some(&AttributeValue::from("H2"))
    );
}
