use std::fmt;
use std::str::FromStr;

use crate::shared::constants::FULL_RESOLUTION_TOKEN;
use crate::shared::errors::FormatError;

/// A user-requested output size.
///
/// Percent tokens and pixel tokens are aliases: `720` is read as "720 out of
/// 1080" and shares its filter with `66`. No ratio is computed from the
/// actual input size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionToken {
    Percent66,
    Percent50,
    Percent33,
    Pixels720,
    Pixels540,
    Pixels320,
}

/// The scale factor a token stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ScaleFactor {
    TwoThirds,
    Half,
    Third,
}

impl ResolutionToken {
    pub const ALL: &[ResolutionToken] = &[
        ResolutionToken::Percent66,
        ResolutionToken::Percent50,
        ResolutionToken::Percent33,
        ResolutionToken::Pixels720,
        ResolutionToken::Pixels540,
        ResolutionToken::Pixels320,
    ];

    /// Used when scaling is requested without any token.
    pub const DEFAULT: ResolutionToken = ResolutionToken::Pixels720;

    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionToken::Percent66 => "66",
            ResolutionToken::Percent50 => "50",
            ResolutionToken::Percent33 => "33",
            ResolutionToken::Pixels720 => "720",
            ResolutionToken::Pixels540 => "540",
            ResolutionToken::Pixels320 => "320",
        }
    }

    pub fn scale(&self) -> ScaleFactor {
        match self {
            ResolutionToken::Percent66 | ResolutionToken::Pixels720 => ScaleFactor::TwoThirds,
            ResolutionToken::Percent50 | ResolutionToken::Pixels540 => ScaleFactor::Half,
            ResolutionToken::Percent33 | ResolutionToken::Pixels320 => ScaleFactor::Third,
        }
    }

    /// True for pixel-count tokens.
    pub fn is_absolute(&self) -> bool {
        matches!(
            self,
            ResolutionToken::Pixels720 | ResolutionToken::Pixels540 | ResolutionToken::Pixels320
        )
    }
}

impl ScaleFactor {
    pub fn filter(&self) -> &'static str {
        match self {
            ScaleFactor::TwoThirds => "scale=iw/3*2:ih/3*2",
            ScaleFactor::Half => "scale=iw/2:ih/2",
            ScaleFactor::Third => "scale=iw/3:ih/3",
        }
    }
}

impl FromStr for ResolutionToken {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_end_matches('%');
        ResolutionToken::ALL
            .iter()
            .copied()
            .find(|token| token.as_str() == trimmed)
            .ok_or_else(|| FormatError::Resolution(s.to_string()))
    }
}

impl fmt::Display for ResolutionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One output file's size: either the source size or a scaled token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResolutionTarget {
    Native,
    Scaled(ResolutionToken),
}

impl ResolutionTarget {
    /// Label written into the output file name.
    pub fn label(&self) -> &'static str {
        match self {
            ResolutionTarget::Native => FULL_RESOLUTION_TOKEN,
            ResolutionTarget::Scaled(token) => token.as_str(),
        }
    }

    pub fn scale_filter(&self) -> Option<&'static str> {
        match self {
            ResolutionTarget::Native => None,
            ResolutionTarget::Scaled(token) => Some(token.scale().filter()),
        }
    }
}

/// Turn the requested tokens into the list of output targets.
///
/// Tokens are first deduplicated by raw equality, then aliases collapse onto
/// the first token seen for each scale factor. Order of first appearance is
/// kept so output order matches the command line.
pub fn resolve_targets(scale: Option<&[ResolutionToken]>) -> Vec<ResolutionTarget> {
    let Some(tokens) = scale else {
        return vec![ResolutionTarget::Native];
    };

    let tokens: Vec<ResolutionToken> = if tokens.is_empty() {
        log::warn!(
            "--scale without resolution given, using {}% ({}p for HD input)",
            ResolutionToken::Percent66,
            ResolutionToken::Pixels720
        );
        vec![ResolutionToken::DEFAULT]
    } else {
        let mut unique: Vec<ResolutionToken> = Vec::with_capacity(tokens.len());
        for token in tokens {
            if !unique.contains(token) {
                unique.push(*token);
            }
        }
        unique
    };

    if tokens.iter().any(ResolutionToken::is_absolute) {
        log::info!("Absolute resolutions are interpreted as <given resolution>/1080 of the input");
    }

    let mut targets: Vec<ResolutionTarget> = Vec::with_capacity(tokens.len());
    let mut seen: Vec<ScaleFactor> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if seen.contains(&token.scale()) {
            log::debug!("Resolution {token} duplicates an earlier alias, skipping");
            continue;
        }
        seen.push(token.scale());
        targets.push(ResolutionTarget::Scaled(token));
    }
    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("66", ResolutionToken::Percent66)]
    #[case("50%", ResolutionToken::Percent50)]
    #[case(" 320 ", ResolutionToken::Pixels320)]
    #[case("540", ResolutionToken::Pixels540)]
    fn test_parse_known_tokens(#[case] input: &str, #[case] expected: ResolutionToken) {
        assert_eq!(input.parse::<ResolutionToken>().unwrap(), expected);
    }

    #[rstest]
    #[case("1080")]
    #[case("abc")]
    #[case("")]
    fn test_parse_unknown_token_is_format_error(#[case] input: &str) {
        assert_eq!(
            input.parse::<ResolutionToken>(),
            Err(FormatError::Resolution(input.to_string()))
        );
    }

    #[rstest]
    #[case(ResolutionToken::Percent66, ResolutionToken::Pixels720)]
    #[case(ResolutionToken::Percent50, ResolutionToken::Pixels540)]
    #[case(ResolutionToken::Percent33, ResolutionToken::Pixels320)]
    fn test_aliases_share_filter(#[case] percent: ResolutionToken, #[case] pixels: ResolutionToken) {
        assert_eq!(percent.scale().filter(), pixels.scale().filter());
    }

    #[test]
    fn test_no_scale_yields_native_target() {
        assert_eq!(resolve_targets(None), vec![ResolutionTarget::Native]);
    }

    #[test]
    fn test_empty_scale_defaults_to_720() {
        assert_eq!(
            resolve_targets(Some(&[])),
            vec![ResolutionTarget::Scaled(ResolutionToken::Pixels720)]
        );
    }

    #[test]
    fn test_raw_duplicates_removed() {
        let tokens = [
            ResolutionToken::Percent50,
            ResolutionToken::Percent50,
            ResolutionToken::Percent33,
        ];
        assert_eq!(
            resolve_targets(Some(&tokens)),
            vec![
                ResolutionTarget::Scaled(ResolutionToken::Percent50),
                ResolutionTarget::Scaled(ResolutionToken::Percent33),
            ]
        );
    }

    #[test]
    fn test_aliases_collapse_to_first_token() {
        let tokens = [
            ResolutionToken::Pixels720,
            ResolutionToken::Percent33,
            ResolutionToken::Percent66,
            ResolutionToken::Pixels320,
        ];
        assert_eq!(
            resolve_targets(Some(&tokens)),
            vec![
                ResolutionTarget::Scaled(ResolutionToken::Pixels720),
                ResolutionTarget::Scaled(ResolutionToken::Percent33),
            ]
        );
    }

    #[test]
    fn test_every_token_combination_has_one_target_per_scale() {
        // All 64 subsets of the token table.
        for mask in 0u32..(1 << ResolutionToken::ALL.len()) {
            let tokens: Vec<ResolutionToken> = ResolutionToken::ALL
                .iter()
                .enumerate()
                .filter(|(i, _)| mask & (1 << i) != 0)
                .map(|(_, t)| *t)
                .collect();
            if tokens.is_empty() {
                continue;
            }
            let mut scales: Vec<ScaleFactor> = tokens.iter().map(|t| t.scale()).collect();
            scales.sort_by_key(|s| *s as u8);
            scales.dedup();

            let targets = resolve_targets(Some(&tokens));
            assert_eq!(targets.len(), scales.len(), "tokens {tokens:?}");
        }
    }

    #[test]
    fn test_native_label_and_filter() {
        assert_eq!(ResolutionTarget::Native.label(), "100");
        assert_eq!(ResolutionTarget::Native.scale_filter(), None);
        assert_eq!(
            ResolutionTarget::Scaled(ResolutionToken::Percent50).scale_filter(),
            Some("scale=iw/2:ih/2")
        );
    }
}
