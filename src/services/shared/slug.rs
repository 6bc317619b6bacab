/// 将任意名称转换为 URL slug
///
/// 非字母数字字符折叠为单个连字符，首尾连字符去除。
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_dash = true;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }

    if slug.is_empty() {
        "item".to_string()
    } else {
        slug
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Wireless Mouse", "wireless-mouse")]
    #[case("  Fancy -- Gadget!  ", "fancy-gadget")]
    #[case("Ceramic Mug 350ml", "ceramic-mug-350ml")]
    #[case("!!!", "item")]
    #[case("", "item")]
    fn test_slugify(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(slugify(name), expected);
    }
}
