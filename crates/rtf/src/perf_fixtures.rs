pub const HEADER: &str = "{\\rtf1\\ansi\\deff0{\\fonttbl{\\f0\\froman Times;}{\\f1\\fswiss Arial;}}\
{\\colortbl;\\red255\\green0\\blue0;}{\\stylesheet{\\s0 Normal;}{\\s1\\b\\fs32 Heading;}}";

pub const BLOCK_TEMPLATE: &str =
    "{\\s1 Title\\par}{\\f1\\cf1 plain {\\b bold {\\i both}} tail}\\par";

pub fn make_blocks(blocks: usize) -> String {
    let mut rtf = String::with_capacity(HEADER.len() + BLOCK_TEMPLATE.len() * blocks + 1);
    rtf.push_str(HEADER);
    for _ in 0..blocks {
        rtf.push_str(BLOCK_TEMPLATE);
    }
    rtf.push('}');
    rtf
}

/// `depth` nested groups each setting bold, around one character.
pub fn make_nested(depth: usize) -> String {
    let mut rtf = String::with_capacity(depth * 5 + 16);
    rtf.push_str("{\\rtf1");
    for _ in 0..depth {
        rtf.push_str("{\\b ");
    }
    rtf.push('x');
    for _ in 0..=depth {
        rtf.push('}');
    }
    rtf
}
