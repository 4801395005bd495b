//! Call-control markup generation.
//!
//! The webhook responses are documents in the external call-control markup:
//! a `<Response>` element wrapping the ordered directive sequence. Uses
//! `quick-xml`'s writer API; text and attribute values are escaped by the
//! writer.

use std::io::Cursor;

use quick_xml::{
  events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
  Writer,
};
use ringline_core::flow::Directive;

/// Render an ordered directive sequence as a complete response document.
pub fn render(directives: &[Directive]) -> Vec<u8> {
  let mut writer = document_writer();
  for directive in directives {
    write_directive(&mut writer, directive);
  }
  finish(writer)
}

/// The fail-safe response: a lone hangup.
pub fn hangup() -> Vec<u8> { render(&[Directive::Hangup]) }

// ─── Writer helpers ──────────────────────────────────────────────────────────

fn document_writer() -> Writer<Cursor<Vec<u8>>> {
  let mut writer = Writer::new(Cursor::new(Vec::new()));
  writer
    .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
    .unwrap();
  writer
    .write_event(Event::Start(BytesStart::new("Response")))
    .unwrap();
  writer
}

fn finish(mut writer: Writer<Cursor<Vec<u8>>>) -> Vec<u8> {
  writer
    .write_event(Event::End(BytesEnd::new("Response")))
    .unwrap();
  writer.into_inner().into_inner()
}

fn write_directive(w: &mut Writer<Cursor<Vec<u8>>>, directive: &Directive) {
  match directive {
    Directive::Hangup => {
      w.write_event(Event::Empty(BytesStart::new("Hangup"))).unwrap();
    }
    Directive::Play { url } => {
      write_text_elem(w, BytesStart::new("Play"), url);
    }
    Directive::Say { message, language, voice } => {
      let mut el = BytesStart::new("Say");
      el.push_attribute(("language", language.as_tag()));
      el.push_attribute(("voice", voice.as_tag()));
      write_text_elem(w, el, message);
    }
    Directive::Dial { number, record, whisper_url } => {
      let mut el = BytesStart::new("Dial");
      el.push_attribute(("record", if *record { "true" } else { "false" }));
      if let Some(url) = whisper_url {
        el.push_attribute(("whisperUrl", url.as_str()));
      }
      write_text_elem(w, el, number);
    }
  }
}

fn write_text_elem(
  w: &mut Writer<Cursor<Vec<u8>>>,
  start: BytesStart<'_>,
  text: &str,
) {
  let name = start.name().as_ref().to_vec();
  w.write_event(Event::Start(start)).unwrap();
  w.write_event(Event::Text(BytesText::new(text))).unwrap();
  w.write_event(Event::End(BytesEnd::new(
    String::from_utf8(name).expect("element names are ASCII"),
  )))
  .unwrap();
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use ringline_core::number::{WhisperLanguage, WhisperVoice};

  use super::*;

  fn render_str(directives: &[Directive]) -> String {
    String::from_utf8(render(directives)).unwrap()
  }

  #[test]
  fn hangup_document() {
    let xml = String::from_utf8(hangup()).unwrap();
    assert!(xml.contains("<Response><Hangup/></Response>"), "xml: {xml}");
  }

  #[test]
  fn directives_render_in_order() {
    let xml = render_str(&[
      Directive::Play { url: "https://cdn.example.com/hi.mp3".to_string() },
      Directive::Dial {
        number:      "15558675309".to_string(),
        record:      true,
        whisper_url: None,
      },
    ]);
    let play = xml.find("<Play>").unwrap();
    let dial = xml.find("<Dial").unwrap();
    assert!(play < dial, "play must precede dial: {xml}");
    assert!(xml.contains("record=\"true\""), "xml: {xml}");
    assert!(xml.contains(">15558675309</Dial>"), "xml: {xml}");
  }

  #[test]
  fn say_escapes_message_text() {
    let xml = render_str(&[Directive::Say {
      message:  "Tom & Jerry <call>".to_string(),
      language: WhisperLanguage::En,
      voice:    WhisperVoice::Neutral,
    }]);
    assert!(xml.contains("language=\"en\""), "xml: {xml}");
    assert!(xml.contains("voice=\"neutral\""), "xml: {xml}");
    assert!(xml.contains("Tom &amp; Jerry &lt;call&gt;"), "xml: {xml}");
  }

  #[test]
  fn whisper_url_lands_on_the_dial_attribute() {
    let xml = render_str(&[Directive::Dial {
      number:      "15558675309".to_string(),
      record:      false,
      whisper_url: Some("http://host/telephony/whisper?message=hi".to_string()),
    }]);
    assert!(
      xml.contains("whisperUrl=\"http://host/telephony/whisper?message=hi\""),
      "xml: {xml}"
    );
  }
}
