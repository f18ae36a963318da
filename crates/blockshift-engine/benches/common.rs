// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
use blockshift_engine::{Attributes, BlockInstance, BlockRegistry, NodeList, parse_fragment};

#[allow(dead_code)]
pub fn generate_article(sections: usize) -> String {
    let base = "<h2 id=\"s\">Section title</h2>\n\n<p class=\"o-lede\">An <strong>introductory</strong> paragraph.</p>\n\n<p>Body text with <em>emphasis</em>, a <a href=\"/x\">link</a> and a<br>line break.</p>\n\n";
    base.repeat(sections)
}

#[allow(dead_code)]
pub fn rich_content(words: usize) -> NodeList {
    let mut markup = String::new();
    for word in 0..words {
        if word % 5 == 0 {
            markup.push_str(&format!("<strong>word{word}</strong> "));
        } else {
            markup.push_str(&format!("word{word} "));
        }
    }
    NodeList::new(parse_fragment(&markup).unwrap())
}

#[allow(dead_code)]
pub fn block_with(registry: &BlockRegistry, name: &str, content: NodeList) -> BlockInstance {
    let mut attributes = Attributes::new();
    attributes.insert("content".into(), content.into());
    registry.create_block(name, attributes).unwrap()
}
