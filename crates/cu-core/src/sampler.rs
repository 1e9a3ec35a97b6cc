//! Sampler name normalization.
//!
//! The synthesis service matches sampler names exactly, while users tend to
//! type them in whatever case they remember.

use serde::Deserialize;

/// One entry of the service's advertised sampler list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SamplerInfo {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

/// Return the advertised spelling of `desired`, matched case-insensitively
/// against sampler names first and aliases second.
pub fn resolve_sampler_name<'a>(desired: &str, advertised: &'a [SamplerInfo]) -> Option<&'a str> {
    let desired = desired.to_lowercase();
    advertised
        .iter()
        .find(|sampler| sampler.name.to_lowercase() == desired)
        .or_else(|| {
            advertised.iter().find(|sampler| {
                sampler.aliases.iter().any(|alias| alias.to_lowercase() == desired)
            })
        })
        .map(|sampler| sampler.name.as_str())
}
