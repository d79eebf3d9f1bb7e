//! Minimal TwiML document builder.
//!
//! Only the verbs the call flow uses are supported. All attribute values and
//! text are XML-escaped.

use std::fmt::Write;

pub const TWIML_CONTENT_TYPE: &str = "text/xml";

/// `<Say>` attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SayOptions {
    pub voice: Option<String>,
    pub language: Option<String>,
}

/// A `<Response>` document under construction.
#[derive(Debug, Clone, Default)]
pub struct VoiceResponse {
    body: String,
}

impl VoiceResponse {
    pub fn new() -> Self {
        Self::default()
    }

    /// `<Start><Stream url=".." track=".."/></Start>`
    pub fn start_stream(mut self, url: &str, track: &str) -> Self {
        let _ = write!(
            self.body,
            r#"<Start><Stream url="{}" track="{}"/></Start>"#,
            escape(url),
            escape(track)
        );
        self
    }

    pub fn say(mut self, text: &str, options: &SayOptions) -> Self {
        self.body.push_str("<Say");
        if let Some(voice) = &options.voice {
            let _ = write!(self.body, r#" voice="{}""#, escape(voice));
        }
        if let Some(language) = &options.language {
            let _ = write!(self.body, r#" language="{}""#, escape(language));
        }
        let _ = write!(self.body, ">{}</Say>", escape(text));
        self
    }

    pub fn play(mut self, url: &str) -> Self {
        let _ = write!(self.body, "<Play>{}</Play>", escape(url));
        self
    }

    /// `<Redirect method="POST">`
    pub fn redirect(mut self, url: &str) -> Self {
        let _ = write!(
            self.body,
            r#"<Redirect method="POST">{}</Redirect>"#,
            escape(url)
        );
        self
    }

    pub fn hangup(mut self) -> Self {
        self.body.push_str("<Hangup/>");
        self
    }

    pub fn to_xml(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><Response>{}</Response>"#,
            self.body
        )
    }
}

/// Escape the five XML special characters.
pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
