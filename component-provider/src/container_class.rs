//! Container class lists.

/// Parse a container class attribute into a list of class names.
///
/// Classes are separated by commas or whitespace, lower-cased and
/// deduplicated; first occurrence wins.
pub fn parse_list(raw: Option<&str>) -> Vec<String> {
    let mut classes: Vec<String> = Vec::new();

    for class in raw
        .unwrap_or_default()
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|c| !c.is_empty())
    {
        let class = class.to_lowercase();
        if !classes.contains(&class) {
            classes.push(class);
        }
    }

    classes
}
