//! # Text Layout
//!
//! Greedy line breaking over styled runs. Break opportunities come from
//! UAX#14 (`unicode-linebreak`); `'\n'` is a mandatory break. A word wider
//! than the line is broken at the character that overflows.
//!
//! Trailing spaces never count toward a line's width and are dropped from
//! its fragments.

use crate::error::MeasurementError;
use crate::font::{FontMetrics, MeasuredLine, Measurement, MetricsProvider};
use crate::style::{FontSpec, LineSpacing};
use unicode_linebreak::{linebreaks, BreakOpportunity};

const EPSILON: f64 = 1e-6;

/// A run of text in one resolved font.
#[derive(Debug, Clone, Copy)]
pub struct StyledRun<'a> {
    pub text: &'a str,
    pub font: &'a FontSpec,
}

/// A contiguous piece of one run on one line.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Index of the run this text comes from.
    pub run: usize,
    pub text: String,
    /// Offset from the start of the line, before any word spacing.
    pub x: f64,
    pub width: f64,
    /// Spaces on the line before this fragment starts.
    pub spaces_before: usize,
}

/// A wrapped line ready to be positioned.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    pub fragments: Vec<Fragment>,
    /// Width without trailing spaces.
    pub width: f64,
    /// Height after the line-spacing rule.
    pub height: f64,
    /// Top of the line to the baseline.
    pub ascent: f64,
    /// Interior spaces, the ones justification stretches.
    pub space_count: usize,
    /// The line was ended by `'\n'` rather than by wrapping.
    pub hard_break: bool,
}

impl Line {
    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn text(&self) -> String {
        self.fragments.iter().map(|f| f.text.as_str()).collect()
    }
}

/// Available widths: the first line may differ because of a first-line
/// indent.
#[derive(Debug, Clone, Copy)]
pub struct LineWidths {
    pub first: f64,
    pub rest: f64,
}

impl LineWidths {
    pub fn uniform(width: f64) -> Self {
        Self {
            first: width,
            rest: width,
        }
    }

    fn for_line(&self, index: usize) -> f64 {
        if index == 0 {
            self.first
        } else {
            self.rest
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct StyledChar {
    ch: char,
    run: usize,
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Entry `i` is the opportunity to break *before* char `i`. Index 0 is
/// always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields byte offsets of the start of the next segment
    let mut byte_to_char = vec![0usize; text.len() + 1];
    for (char_idx, (byte_idx, _)) in text.char_indices().enumerate() {
        byte_to_char[byte_idx] = char_idx;
    }
    byte_to_char[text.len()] = char_count;

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx > 0 && char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

fn is_control(ch: char) -> bool {
    ch == '\n' || ch == '\r'
}

fn is_space(ch: char) -> bool {
    ch == ' ' || ch == '\t'
}

/// Break styled runs into lines and compute each line's geometry.
///
/// `base` supplies the height of lines without any text (an empty
/// paragraph, or the line after a trailing `'\n'`).
pub fn compose_lines<M: MetricsProvider + ?Sized>(
    metrics: &M,
    runs: &[StyledRun],
    base: &FontSpec,
    widths: LineWidths,
    spacing: LineSpacing,
) -> Result<Vec<Line>, MeasurementError> {
    let mut run_metrics: Vec<Option<FontMetrics>> = Vec::with_capacity(runs.len());
    for run in runs {
        run_metrics.push(if run.text.is_empty() {
            None
        } else {
            Some(metrics.font_metrics(run.font)?)
        });
    }
    let base_metrics = metrics.font_metrics(base)?;

    let chars: Vec<StyledChar> = runs
        .iter()
        .enumerate()
        .flat_map(|(run, r)| r.text.chars().map(move |ch| StyledChar { ch, run }))
        .collect();

    let mut char_widths = Vec::with_capacity(chars.len());
    for sc in &chars {
        char_widths.push(if is_control(sc.ch) {
            0.0
        } else {
            metrics.char_width(runs[sc.run].font, sc.ch)?
        });
    }

    let plain: String = chars.iter().map(|sc| sc.ch).collect();
    let break_opps = compute_break_opportunities(&plain);

    // (start, end, hard_break) spans into `chars`
    let mut spans: Vec<(usize, usize, bool)> = Vec::new();
    let mut line_start = 0;
    let mut line_width = 0.0;
    let mut last_break_point: Option<usize> = None;

    for (i, sc) in chars.iter().enumerate() {
        if sc.ch == '\n' {
            spans.push((line_start, i, true));
            line_start = i + 1;
            line_width = 0.0;
            last_break_point = None;
            continue;
        }

        if i > line_start && break_opps[i].is_some() {
            last_break_point = Some(i);
        }

        let w = char_widths[i];
        let limit = widths.for_line(spans.len());
        if line_width + w > limit + EPSILON && i > line_start && !is_space(sc.ch) {
            match last_break_point.filter(|&bp| bp > line_start) {
                Some(bp) => {
                    spans.push((line_start, bp, false));
                    line_start = bp;
                    line_width = char_widths[bp..=i].iter().sum();
                }
                None => {
                    spans.push((line_start, i, false));
                    line_start = i;
                    line_width = w;
                }
            }
            last_break_point = None;
            continue;
        }

        line_width += w;
    }
    spans.push((line_start, chars.len(), false));

    Ok(spans
        .into_iter()
        .map(|(start, end, hard_break)| {
            let fallback = if start > 0 {
                chars.get(start - 1).and_then(|sc| run_metrics[sc.run])
            } else {
                None
            };
            build_line(
                &chars[start..end],
                &char_widths[start..end],
                &run_metrics,
                fallback.unwrap_or(base_metrics),
                spacing,
                hard_break,
            )
        })
        .collect())
}

fn build_line(
    chars: &[StyledChar],
    widths: &[f64],
    run_metrics: &[Option<FontMetrics>],
    empty_metrics: FontMetrics,
    spacing: LineSpacing,
    hard_break: bool,
) -> Line {
    let mut end = chars.len();
    while end > 0 && (is_space(chars[end - 1].ch) || is_control(chars[end - 1].ch)) {
        end -= 1;
    }

    let mut fragments: Vec<Fragment> = Vec::new();
    let mut x = 0.0;
    let mut spaces = 0;
    for (sc, &w) in chars[..end].iter().zip(widths) {
        if sc.ch == '\r' {
            continue;
        }
        match fragments.last_mut() {
            Some(frag) if frag.run == sc.run => {
                frag.text.push(sc.ch);
                frag.width += w;
            }
            _ => fragments.push(Fragment {
                run: sc.run,
                text: sc.ch.to_string(),
                x,
                width: w,
                spaces_before: spaces,
            }),
        }
        if sc.ch == ' ' {
            spaces += 1;
        }
        x += w;
    }

    let (natural, ascent) = fragments
        .iter()
        .filter_map(|f| run_metrics[f.run])
        .fold(None, |acc: Option<(f64, f64)>, m| match acc {
            Some((h, a)) => Some((h.max(m.line_height), a.max(m.ascent))),
            None => Some((m.line_height, m.ascent)),
        })
        .unwrap_or((empty_metrics.line_height, empty_metrics.ascent));

    let height = spacing.apply(natural);
    let ascent = if height < natural && natural > 0.0 {
        ascent * height / natural
    } else {
        ascent
    };

    Line {
        fragments,
        width: x,
        height,
        ascent,
        space_count: spaces,
        hard_break,
    }
}

/// Single-font measurement backing [`MetricsProvider::measure`].
pub fn measure_plain<M: MetricsProvider + ?Sized>(
    metrics: &M,
    font: &FontSpec,
    text: &str,
    max_width: f64,
) -> Result<Measurement, MeasurementError> {
    let font_metrics = metrics.font_metrics(font)?;
    let lines = compose_lines(
        metrics,
        &[StyledRun { text, font }],
        font,
        LineWidths::uniform(max_width),
        LineSpacing::Single,
    )?;
    Ok(Measurement {
        lines: lines
            .iter()
            .map(|l| MeasuredLine {
                text: l.text(),
                width: l.width,
            })
            .collect(),
        line_height: font_metrics.line_height,
        ascent: font_metrics.ascent,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::FontContext;

    fn courier(size: f64) -> FontSpec {
        FontSpec {
            family: "Courier".to_string(),
            size,
            ..Default::default()
        }
    }

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(|l| l.text()).collect()
    }

    fn compose(text: &str, width: f64) -> Vec<Line> {
        let ctx = FontContext::new();
        let font = courier(10.0);
        compose_lines(
            &ctx,
            &[StyledRun { text, font: &font }],
            &font,
            LineWidths::uniform(width),
            LineSpacing::Single,
        )
        .unwrap()
    }

    #[test]
    fn test_break_opportunities_skip_first() {
        let opps = compute_break_opportunities("ab cd");
        assert_eq!(opps[0], None);
        assert_eq!(opps[3], Some(BreakOpportunity::Allowed));
        assert_eq!(opps[1], None);
    }

    #[test]
    fn test_empty_text_is_one_line() {
        let lines = compose("", 100.0);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].is_empty());
        let m = FontContext::new().font_metrics(&courier(10.0)).unwrap();
        assert!((lines[0].height - m.line_height).abs() < 1e-9);
    }

    #[test]
    fn test_wraps_at_spaces() {
        // 6pt per glyph: "hello " = 36pt
        let lines = compose("hello world again", 72.0);
        assert_eq!(texts(&lines), vec!["hello world", "again"]);
        assert!((lines[0].width - 66.0).abs() < 1e-9);
        assert_eq!(lines[0].space_count, 1);
    }

    #[test]
    fn test_trailing_spaces_do_not_overflow() {
        let lines = compose("abc     def", 24.0);
        assert_eq!(texts(&lines), vec!["abc", "def"]);
        assert!((lines[0].width - 18.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_word_is_forced_apart() {
        let lines = compose("abcdefghij", 30.0);
        assert_eq!(texts(&lines), vec!["abcde", "fghij"]);
    }

    #[test]
    fn test_newline_is_mandatory() {
        let lines = compose("one\ntwo\n", 1000.0);
        assert_eq!(texts(&lines), vec!["one", "two", ""]);
        assert!(lines[0].hard_break);
        assert!(lines[1].hard_break);
        assert!(!lines[2].hard_break);
    }

    #[test]
    fn test_first_line_width() {
        let ctx = FontContext::new();
        let font = courier(10.0);
        let lines = compose_lines(
            &ctx,
            &[StyledRun {
                text: "aaa bbb ccc",
                font: &font,
            }],
            &font,
            LineWidths {
                first: 24.0,
                rest: 100.0,
            },
            LineSpacing::Single,
        )
        .unwrap();
        assert_eq!(texts(&lines), vec!["aaa", "bbb ccc"]);
    }

    #[test]
    fn test_runs_become_fragments() {
        let ctx = FontContext::new();
        let small = courier(10.0);
        let big = courier(20.0);
        let lines = compose_lines(
            &ctx,
            &[
                StyledRun {
                    text: "ab ",
                    font: &small,
                },
                StyledRun {
                    text: "cd",
                    font: &big,
                },
            ],
            &small,
            LineWidths::uniform(500.0),
            LineSpacing::Single,
        )
        .unwrap();
        assert_eq!(lines.len(), 1);
        let line = &lines[0];
        assert_eq!(line.fragments.len(), 2);
        assert!((line.fragments[1].x - 18.0).abs() < 1e-9);
        assert_eq!(line.fragments[1].spaces_before, 1);
        // tallest font wins
        let m = ctx.font_metrics(&big).unwrap();
        assert!((line.height - m.line_height).abs() < 1e-9);
        assert!((line.ascent - m.ascent).abs() < 1e-9);
    }

    #[test]
    fn test_exact_spacing_scales_ascent() {
        let ctx = FontContext::new();
        let font = courier(10.0);
        let lines = compose_lines(
            &ctx,
            &[StyledRun {
                text: "x",
                font: &font,
            }],
            &font,
            LineWidths::uniform(100.0),
            LineSpacing::Exactly(crate::model::Length(5.0)),
        )
        .unwrap();
        let m = ctx.font_metrics(&font).unwrap();
        assert_eq!(lines[0].height, 5.0);
        assert!((lines[0].ascent - m.ascent * 5.0 / m.line_height).abs() < 1e-9);
    }

    #[test]
    fn test_missing_glyph_propagates() {
        let ctx = FontContext::new();
        let font = courier(10.0);
        let err = compose_lines(
            &ctx,
            &[StyledRun {
                text: "na\u{4e2d}ve",
                font: &font,
            }],
            &font,
            LineWidths::uniform(100.0),
            LineSpacing::Single,
        )
        .unwrap_err();
        assert!(matches!(err, MeasurementError::MissingGlyph { .. }));
    }
}
