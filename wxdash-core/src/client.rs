use std::fmt::Debug;

use async_trait::async_trait;

use crate::model::Location;

pub mod archive;
pub mod current;
pub mod geocode;

pub use archive::{ArchiveError, HistoryClient};
pub use current::CurrentClient;
pub use geocode::GeocodeClient;

/// Resolves a free-text place to coordinates.
///
/// An empty result means "location not found"; it is never an error.
/// The historical pipeline takes this as a seam so it can short-circuit on
/// unresolvable input without touching the archive service.
#[async_trait]
pub trait Geocoder: Send + Sync + Debug {
    async fn geocode(
        &self,
        city: &str,
        state: &str,
        country: &str,
        limit: u32,
    ) -> anyhow::Result<Vec<Location>>;
}

/// Keep remote error bodies readable in error chains.
pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    // The cut must land on a char boundary; MAX may fall inside a
    // multibyte character.
    let cut = (0..=MAX)
        .rev()
        .find(|i| body.is_char_boundary(*i))
        .unwrap_or(0);
    format!("{}...", &body[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_pass_through() {
        assert_eq!(truncate_body("oops"), "oops");
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn cut_backs_off_to_a_char_boundary() {
        // 'é' is two bytes and straddles the 200-byte cut point.
        let body = format!("{}é and more", "x".repeat(199));
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated, format!("{}...", "x".repeat(199)));
    }

    #[test]
    fn multibyte_only_bodies_do_not_panic() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.trim_end_matches("...").len(), 200);
    }
}
