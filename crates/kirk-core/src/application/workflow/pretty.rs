use std::fmt::Display;

use quick_xml::events::{
    BytesStart,
    Event,
};
use quick_xml::{
    Reader,
    Writer,
};

use crate::{
    KirkError,
    KirkResult,
};

const INDENT_SIZE: usize = 2;

fn xml_error(position: impl Display, err: impl Display) -> KirkError {
    KirkError::Template(format!("Malformed XML at position {position}: {err}"))
}

/// Re-indents an XML document.
///
/// Insignificant whitespace is dropped, elements without content become
/// `<name/>` and the output has no blank lines.
pub fn prettify(xml: &str) -> KirkResult<String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_SIZE);
    let mut pending: Option<BytesStart<'_>> = None;

    loop {
        let position = reader.buffer_position();
        let event = reader.read_event().map_err(|e| xml_error(position, e))?;

        let event = match event {
            Event::Eof => break,
            Event::End(end) => match pending.take() {
                Some(start) => Event::Empty(start),
                None => Event::End(end),
            },
            event => {
                if let Some(start) = pending.take() {
                    writer
                        .write_event(Event::Start(start))
                        .map_err(|e| xml_error(position, e))?;
                }

                match event {
                    Event::Start(start) => {
                        pending = Some(start);
                        continue;
                    }
                    event => event,
                }
            }
        };

        writer
            .write_event(event)
            .map_err(|e| xml_error(position, e))?;
    }

    if let Some(start) = pending {
        return Err(xml_error(
            reader.buffer_position(),
            format!(
                "unclosed element '{}'",
                String::from_utf8_lossy(start.name().as_ref())
            ),
        ));
    }

    let output = String::from_utf8(writer.into_inner())
        .map_err(|e| KirkError::Template(format!("Invalid UTF-8 in XML output: {e}")))?;

    Ok(output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prettify() {
        let xml = "<?xml version='1.1' encoding='UTF-8'?>\n\n   <root>\n  <!-- Generics -->\n<a>  text  </a>\n\n\n<b></b><c>\n</c><d><e>1</e></d></root>";

        let pretty = prettify(xml).unwrap();

        assert_eq!(
            pretty,
            "<?xml version='1.1' encoding='UTF-8'?>\n\
             <root>\n\
             \x20 <!-- Generics -->\n\
             \x20 <a>text</a>\n\
             \x20 <b/>\n\
             \x20 <c/>\n\
             \x20 <d>\n\
             \x20   <e>1</e>\n\
             \x20 </d>\n\
             </root>"
        );
    }

    #[test]
    fn test_escaped_text_is_kept() {
        let pretty = prettify("<a><b>x &lt; y &amp;&amp; z</b></a>").unwrap();
        assert_eq!(pretty, "<a>\n  <b>x &lt; y &amp;&amp; z</b>\n</a>");
    }

    #[test]
    fn test_malformed_xml() {
        assert!(matches!(
            prettify("<a><b></a>"),
            Err(KirkError::Template(_))
        ));
        assert!(matches!(prettify("<a><b>"), Err(KirkError::Template(_))));
    }
}
