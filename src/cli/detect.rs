use anyhow::{bail, Context, Result};
use clap::Args;
use host_dom::text::{utf16_len, utf16_to_byte};
use host_dom::CursorSnapshot;
use slash_detect::SlashContext;

#[derive(Args, Clone, Debug)]
pub struct DetectArgs {
    /// Field text
    #[arg(short, long)]
    pub text: String,

    /// Caret offset in UTF-16 units (defaults to the end of the text)
    #[arg(long)]
    pub cursor: Option<usize>,
}

fn detect_at(text: &str, cursor: Option<usize>) -> Result<Option<SlashContext>> {
    let caret = cursor.unwrap_or_else(|| utf16_len(text));
    let Some(split) = utf16_to_byte(text, caret) else {
        bail!("cursor {caret} is not a character boundary inside the text");
    };
    let snapshot = CursorSnapshot::Plain {
        before: text[..split].to_string(),
        caret,
    };
    Ok(slash_detect::detect(&snapshot))
}

pub fn cmd_detect(args: DetectArgs) -> Result<()> {
    let context = detect_at(&args.text, args.cursor)?;
    println!(
        "{}",
        serde_json::to_string(&context).context("failed to encode slash context")?
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slash_detect::SlashSpan;

    #[test]
    fn detects_at_end_by_default() {
        let context = detect_at("ask //sum", None).unwrap().unwrap();
        assert_eq!(context.query, "sum");
        assert_eq!(context.span, SlashSpan::PlainField { start: 4, end: 9 });
    }

    #[test]
    fn cursor_limits_the_text_before_the_caret() {
        assert_eq!(detect_at("ask //sum later", Some(15)).unwrap(), None);
        assert!(detect_at("ask //sum later", Some(9)).unwrap().is_some());
        assert!(detect_at("ask", Some(10)).is_err());
    }
}
