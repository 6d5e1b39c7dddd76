//! Minimal XML scanning for SOAP responses
//!
//! Devices disagree on namespace prefixes (`tt:`, `trt:`, `ns2:`, none), so
//! every lookup here matches on the local name only. Good enough for
//! well-formed device responses; not a general XML parser.

/// One element located in a document
#[derive(Debug, Clone, Copy)]
pub struct Element<'a> {
    /// Opening tag without `<`, `>` and trailing `/`
    tag: &'a str,
    /// Raw content between the opening and closing tags
    inner: &'a str,
    /// Offset just past the closing tag in the searched text
    end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TagKind {
    Open,
    Close,
    Empty,
}

#[derive(Debug)]
struct Tag<'a> {
    start: usize,
    end: usize,
    name: &'a str,
    kind: TagKind,
    raw: &'a str,
}

impl<'a> Element<'a> {
    /// Raw inner content
    pub fn inner(&self) -> &'a str {
        self.inner
    }

    /// Trimmed, unescaped text content
    pub fn text(&self) -> String {
        unescape(self.inner.trim())
    }

    /// Attribute value by local name
    pub fn attr(&self, name: &str) -> Option<String> {
        let (_, mut rest) = self.tag.split_once(char::is_whitespace)?;

        loop {
            rest = rest.trim_start();
            let eq = rest.find('=')?;
            let key = rest[..eq].trim();
            let after = rest[eq + 1..].trim_start();

            let quote = after.chars().next()?;
            if quote != '"' && quote != '\'' {
                return None;
            }
            let value_len = after[1..].find(quote)?;
            let value = &after[1..1 + value_len];

            if local_name(key) == name {
                return Some(unescape(value));
            }
            rest = &after[value_len + 2..];
        }
    }

    /// First descendant with local name `name`
    pub fn child(&self, name: &str) -> Option<Element<'a>> {
        element(self.inner, name)
    }

    /// All descendants with local name `name`, outermost only
    pub fn children(&self, name: &str) -> Vec<Element<'a>> {
        elements(self.inner, name)
    }

    /// Non-empty text of the first descendant named `name`
    pub fn child_text(&self, name: &str) -> Option<String> {
        child_text(self.inner, name)
    }
}

/// First element with local name `name`
pub fn element<'a>(xml: &'a str, name: &str) -> Option<Element<'a>> {
    element_from(xml, name, 0)
}

/// Every element with local name `name`, outermost only
pub fn elements<'a>(xml: &'a str, name: &str) -> Vec<Element<'a>> {
    let mut found = Vec::new();
    let mut pos = 0;

    while let Some(el) = element_from(xml, name, pos) {
        pos = el.end;
        found.push(el);
    }

    found
}

/// Non-empty text of the first element named `name`
pub fn child_text(xml: &str, name: &str) -> Option<String> {
    element(xml, name)
        .map(|el| el.text())
        .filter(|text| !text.is_empty())
}

fn element_from<'a>(xml: &'a str, name: &str, from: usize) -> Option<Element<'a>> {
    let mut pos = from;

    loop {
        let open = next_tag(xml, pos)?;
        pos = open.end;

        if open.name != name {
            continue;
        }

        match open.kind {
            TagKind::Close => continue,
            TagKind::Empty => {
                return Some(Element {
                    tag: open.raw,
                    inner: "",
                    end: open.end,
                })
            }
            TagKind::Open => {}
        }

        // Nested elements with the same local name are balanced by depth
        let mut depth = 1usize;
        let mut scan = open.end;
        loop {
            let tag = next_tag(xml, scan)?;
            scan = tag.end;

            if tag.name != name {
                continue;
            }
            match tag.kind {
                TagKind::Open => depth += 1,
                TagKind::Empty => {}
                TagKind::Close => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(Element {
                            tag: open.raw,
                            inner: &xml[open.end..tag.start],
                            end: tag.end,
                        });
                    }
                }
            }
        }
    }
}

fn next_tag(xml: &str, from: usize) -> Option<Tag<'_>> {
    let mut pos = from;

    loop {
        let start = pos + xml.get(pos..)?.find('<')?;
        let rest = &xml[start + 1..];

        // Declarations, comments, CDATA
        let skip = if rest.starts_with("!--") {
            Some(rest.find("-->")? + 3)
        } else if rest.starts_with("![CDATA[") {
            Some(rest.find("]]>")? + 3)
        } else if rest.starts_with('?') || rest.starts_with('!') {
            Some(rest.find('>')? + 1)
        } else {
            None
        };
        if let Some(len) = skip {
            pos = start + 1 + len;
            continue;
        }

        let body_len = rest.find('>')?;
        let body = &rest[..body_len];
        let end = start + 1 + body_len + 1;

        let (kind, raw) = if let Some(raw) = body.strip_prefix('/') {
            (TagKind::Close, raw.trim())
        } else if let Some(raw) = body.strip_suffix('/') {
            (TagKind::Empty, raw.trim())
        } else {
            (TagKind::Open, body.trim())
        };

        let qname = raw.split(char::is_whitespace).next().unwrap_or("");

        return Some(Tag {
            start,
            end,
            name: local_name(qname),
            kind,
            raw,
        });
    }
}

fn local_name(qname: &str) -> &str {
    qname.rsplit(':').next().unwrap_or(qname)
}

/// Escape text for inclusion in element content or attribute values
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

/// Resolve the predefined entities
pub fn unescape(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROFILES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<env:Envelope xmlns:env="http://www.w3.org/2003/05/soap-envelope">
  <env:Body>
    <trt:GetProfilesResponse>
      <trt:Profiles token="main" fixed="true">
        <tt:Name>Main &amp; Sub</tt:Name>
        <tt:VideoSourceConfiguration token='vsc'>
          <tt:SourceToken>VideoSource_1</tt:SourceToken>
        </tt:VideoSourceConfiguration>
        <tt:PTZConfiguration token="ptz"/>
      </trt:Profiles>
      <!-- <trt:Profiles token="commented"/> -->
      <Profiles token="sub">
        <Name>Sub</Name>
      </Profiles>
    </trt:GetProfilesResponse>
  </env:Body>
</env:Envelope>"#;

    #[test]
    fn test_namespace_agnostic_lookup() {
        let profiles = elements(PROFILES, "Profiles");
        assert_eq!(profiles.len(), 2);

        assert_eq!(profiles[0].attr("token").as_deref(), Some("main"));
        assert_eq!(profiles[0].child_text("Name").as_deref(), Some("Main & Sub"));
        assert_eq!(profiles[1].attr("token").as_deref(), Some("sub"));
        assert_eq!(profiles[1].child_text("Name").as_deref(), Some("Sub"));
    }

    #[test]
    fn test_nested_and_empty_elements() {
        let main = element(PROFILES, "Profiles").unwrap();

        let vsc = main.child("VideoSourceConfiguration").unwrap();
        assert_eq!(vsc.attr("token").as_deref(), Some("vsc"));
        assert_eq!(vsc.child_text("SourceToken").as_deref(), Some("VideoSource_1"));

        let ptz = main.child("PTZConfiguration").unwrap();
        assert_eq!(ptz.attr("token").as_deref(), Some("ptz"));
        assert_eq!(ptz.inner(), "");
    }

    #[test]
    fn test_same_name_nesting_balanced() {
        let xml = "<a:Value>outer<b:Value>inner</b:Value>tail</a:Value><Value>next</Value>";

        let first = element(xml, "Value").unwrap();
        assert_eq!(first.inner(), "outer<b:Value>inner</b:Value>tail");
        assert_eq!(elements(xml, "Value").len(), 2);
    }

    #[test]
    fn test_missing() {
        assert!(element(PROFILES, "Uri").is_none());
        assert!(child_text("<Uri>   </Uri>", "Uri").is_none());
        assert!(element("<Uri>unterminated", "Uri").is_none());
    }

    #[test]
    fn test_escape_unescape() {
        assert_eq!(escape("a<b>&\"c'"), "a&lt;b&gt;&amp;&quot;c&apos;");
        assert_eq!(unescape("a&lt;b&gt;&amp;&quot;c&apos;"), "a<b>&\"c'");
        assert_eq!(unescape("&amp;lt;"), "&lt;");
    }
}
