//! Raw `application/x-www-form-urlencoded` bodies with repeated and
//! dynamically named keys (checkbox groups, numbered rows, per-slot fields).

fn url_decode(s: &str) -> String {
    let s = s.replace('+', " ");
    let mut out = Vec::with_capacity(s.len());
    let b = s.as_bytes();
    let mut i = 0;
    while i < b.len() {
        if b[i] == b'%' && i + 2 < b.len() {
            let hex = std::str::from_utf8(&b[i + 1..i + 3]).unwrap_or("");
            if let Ok(byte) = u8::from_str_radix(hex, 16) {
                out.push(byte);
                i += 3;
                continue;
            }
        }
        out.push(b[i]);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Decoded key/value pairs in submission order.
#[derive(Debug, Clone, Default)]
pub struct FormData(Vec<(String, String)>);

impl FormData {
    pub fn parse(body: &str) -> Self {
        let pairs = body
            .split('&')
            .filter(|s| !s.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=').unwrap_or((pair, ""));
                (url_decode(k), url_decode(v))
            })
            .collect();
        FormData(pairs)
    }

    /// First value for `key`, or "" when absent.
    pub fn get(&self, key: &str) -> &str {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// All values for a repeated key, in order.
    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.iter().any(|(k, _)| k == key)
    }

    /// Trimmed value parsed as an id; blank or invalid gives `None`.
    pub fn get_id(&self, key: &str) -> Option<i64> {
        self.get(key).trim().parse().ok()
    }

    pub fn csrf_token(&self) -> &str {
        self.get("csrf_token")
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_repeated_and_escaped_values() {
        let form = FormData::parse("name=Maria+Schmidt&perm=talk&perm=prayer&note=a%26b&empty=");
        assert_eq!(form.get("name"), "Maria Schmidt");
        assert_eq!(form.get_all("perm"), vec!["talk", "prayer"]);
        assert_eq!(form.get("note"), "a&b");
        assert!(form.contains("empty"));
        assert_eq!(form.get("missing"), "");
    }

    #[test]
    fn decodes_multibyte_and_trailing_percent() {
        let form = FormData::parse("n=J%C3%BCrgen&t=100%");
        assert_eq!(form.get("n"), "Jürgen");
        assert_eq!(form.get("t"), "100%");
    }

    #[test]
    fn ids_parse_or_are_absent() {
        let form = FormData::parse("group=12&other=&bad=x");
        assert_eq!(form.get_id("group"), Some(12));
        assert_eq!(form.get_id("other"), None);
        assert_eq!(form.get_id("bad"), None);
    }
}
