use crate::clusterizer::ClusterizerPars;
use crate::gen::Positive;
use std::collections::HashSet;
use std::fmt;
use winnow::ascii::{float, hex_uint, newline};
use winnow::combinator::{opt, preceded, separated, terminated};
use winnow::error::ContextError;
use winnow::Parser;

/// Clusterizer parameters of every diamond of the BMON detector.
///
/// The text representation has one diamond per line, e.g.:
///
/// ```text
/// address=0x00002806 dead_strips=0x00000000 time_res=0.08 max_time_dist=1
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitfindSetup {
    diamonds: Vec<ClusterizerPars>,
}

impl HitfindSetup {
    pub fn new(diamonds: Vec<ClusterizerPars>) -> Self {
        Self { diamonds }
    }
    pub fn diamonds(&self) -> &[ClusterizerPars] {
        &self.diamonds
    }
}

impl fmt::Display for HitfindSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .diamonds
            .iter()
            .map(|pars| {
                format!(
                    "address=0x{:08x} dead_strips=0x{:08x} time_res={} max_time_dist={}",
                    pars.address(),
                    pars.dead_strips(),
                    pars.time_res(),
                    pars.max_time_dist()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        write!(f, "{text}")
    }
}

// Values exactly as written in the file. Semantic checks happen after the
// whole input is known to be well formed.
struct DiamondLine {
    address: u32,
    dead_strips: u32,
    time_res: f64,
    max_time_dist: f64,
}

fn parse_line(input: &mut &str) -> winnow::Result<DiamondLine> {
    (
        preceded("address=0x", hex_uint),
        preceded(" dead_strips=0x", hex_uint),
        preceded(" time_res=", float),
        preceded(" max_time_dist=", float),
    )
        .map(
            |(address, dead_strips, time_res, max_time_dist)| DiamondLine {
                address,
                dead_strips,
                time_res,
                max_time_dist,
            },
        )
        .parse_next(input)
}

/// The error type returned when a setup is syntactically invalid.
#[derive(Debug)]
pub struct ParseError {
    input: String,
    span: std::ops::Range<usize>,
}

impl ParseError {
    fn from_parse(error: winnow::error::ParseError<&str, ContextError>) -> Self {
        let input = error.input().to_string();
        let span = error.char_span();
        Self { input, span }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = annotate_snippets::Level::Error
            .title("invalid diamond setup starting here")
            .snippet(
                annotate_snippets::Snippet::source(&self.input)
                    .fold(true)
                    .annotation(annotate_snippets::Level::Error.span(self.span.clone())),
            );
        let renderer = annotate_snippets::Renderer::plain();
        let rendered = renderer.render(message);
        rendered.fmt(f)
    }
}

impl std::error::Error for ParseError {}

/// The error type returned when building a hit finder setup fails.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A parameter that must be strictly positive is not. `line` is 1-based.
    #[error("line {line}: `{name}` must be positive, found {value}")]
    NotPositive {
        line: usize,
        name: &'static str,
        value: f64,
    },
    #[error("diamond address 0x{0:08x} is configured more than once")]
    DuplicateDiamond(u32),
}

fn positive(line: usize, name: &'static str, value: f64) -> Result<Positive<f64>, SetupError> {
    Positive::new(value).ok_or(SetupError::NotPositive { line, name, value })
}

impl std::str::FromStr for HitfindSetup {
    type Err = SetupError;

    /// Parse a [`HitfindSetup`] from a string. An empty string is a setup
    /// without diamonds.
    ///
    /// # Examples
    ///
    /// ```
    /// use bmon::setup::HitfindSetup;
    /// use std::str::FromStr;
    ///
    /// let setup = HitfindSetup::from_str(
    ///     "address=0x00002806 dead_strips=0x00000001 time_res=0.08 max_time_dist=1",
    /// )?;
    /// assert_eq!(setup.diamonds().len(), 1);
    /// assert_eq!(setup.diamonds()[0].dead_strips(), 1);
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let lines: Vec<DiamondLine> =
            terminated(separated(0.., parse_line, newline), opt(newline))
                .parse(input)
                .map_err(ParseError::from_parse)?;

        let mut seen = HashSet::new();
        let mut diamonds = Vec::with_capacity(lines.len());
        for (n, line) in lines.into_iter().enumerate() {
            let n = n + 1;
            if !seen.insert(line.address) {
                return Err(SetupError::DuplicateDiamond(line.address));
            }
            diamonds.push(
                ClusterizerPars::builder()
                    .address(line.address)
                    .dead_strips(line.dead_strips)
                    .time_res(positive(n, "time_res", line.time_res)?)
                    .max_time_dist(positive(n, "max_time_dist", line.max_time_dist)?)
                    .build(),
            );
        }

        Ok(Self { diamonds })
    }
}
