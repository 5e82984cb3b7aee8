//! Nearest-color matching of target tiles against the image pool
//!
//! Usage count and rank only decide which signature entries are eligible;
//! among eligible entries the choice is purely the smallest squared
//! ab-distance to the tile's dominant color.

use crate::color::lab::{Lab, ab_distance_squared};
use crate::color::signature::SignatureExtractor;
use crate::io::configuration::{
    DEFAULT_CANDIDATE_LIMIT, DEFAULT_MATCH_TIMEOUT_MS, DEFAULT_MAX_USAGES,
};
use crate::io::error::{MosaicError, Result, invalid_parameter};
use crate::pool::store::{Candidate, ImagePool};
use image::RgbImage;
use log::{debug, trace};
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// Limits applied to every tile query
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MatchConfig {
    /// Times one pool image may be placed in a run
    pub max_usages: u32,
    /// Nearest candidates kept after sorting by distance
    pub candidate_limit: usize,
    /// Time budget for a single tile query
    pub timeout: Duration,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_usages: DEFAULT_MAX_USAGES,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
            timeout: Duration::from_millis(DEFAULT_MATCH_TIMEOUT_MS),
        }
    }
}

impl MatchConfig {
    /// Check that the configuration can ever produce a match
    ///
    /// # Errors
    ///
    /// Returns an error if `candidate_limit` is zero
    pub fn validate(&self) -> Result<()> {
        if self.candidate_limit == 0 {
            return Err(invalid_parameter(
                "candidate_limit",
                &self.candidate_limit,
                &"at least one candidate must be considered",
            ));
        }
        Ok(())
    }
}

/// The pool image chosen for one tile
#[derive(Clone, Debug, PartialEq)]
pub struct Match {
    /// Identity of the chosen image
    pub image_id: i64,
    /// Source file of the chosen image
    pub filename: String,
    /// Rank of the signature color that matched
    pub rank: u32,
    /// Squared ab-distance between that color and the tile's dominant color
    pub distance: f64,
    /// Usage count of the image before this match claimed it
    pub usage_count: u32,
}

/// A candidate paired with its score against one tile
#[derive(Clone, Debug, PartialEq)]
pub struct ScoredCandidate {
    /// Pool entry being scored
    pub candidate: Candidate,
    /// Squared ab-distance to the tile color
    pub distance: f64,
}

/// Score every candidate against `target` and keep the `limit` nearest
///
/// Ordering is ascending distance, ties broken by image identity then rank
/// so the result is stable for a fixed pool.
pub fn rank_candidates(candidates: Vec<Candidate>, target: Lab, limit: usize) -> Vec<ScoredCandidate> {
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_par_iter()
        .map(|candidate| ScoredCandidate {
            distance: ab_distance_squared(candidate.lab, target),
            candidate,
        })
        .collect();

    scored.sort_by(|lhs, rhs| {
        lhs.distance
            .total_cmp(&rhs.distance)
            .then(lhs.candidate.image_id.cmp(&rhs.candidate.image_id))
            .then(lhs.candidate.rank.cmp(&rhs.candidate.rank))
    });
    scored.truncate(limit);
    scored
}

/// Finds the best eligible pool image for target tiles
pub struct TileMatcher<'a> {
    pool: &'a ImagePool,
    extractor: &'a SignatureExtractor,
    config: MatchConfig,
}

impl<'a> TileMatcher<'a> {
    /// Create a matcher over `pool`
    pub const fn new(
        pool: &'a ImagePool,
        extractor: &'a SignatureExtractor,
        config: MatchConfig,
    ) -> Self {
        Self {
            pool,
            extractor,
            config,
        }
    }

    /// Active limits
    pub const fn config(&self) -> MatchConfig {
        self.config
    }

    /// Match a tile by its most abundant color and claim the winning image
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The tile has no pixels
    /// - Every image has already been used `max_usages` times
    ///   ([`MosaicError::PoolExhausted`])
    /// - The query runs past the configured timeout
    ///   ([`MosaicError::MatchTimeout`])
    /// - The pool store fails
    pub fn find_match(&self, tile: &RgbImage) -> Result<Match> {
        let started = Instant::now();
        let target = self.extractor.dominant_lab(tile).ok_or_else(|| {
            invalid_parameter(
                "tile",
                &format!("{}x{}", tile.width(), tile.height()),
                &"tile has no pixels",
            )
        })?;
        self.match_color_since(target, started)
    }

    /// Match a Lab color directly and claim the winning image
    ///
    /// # Errors
    ///
    /// Same as [`TileMatcher::find_match`], minus the empty-tile case
    pub fn match_color(&self, target: Lab) -> Result<Match> {
        self.match_color_since(target, Instant::now())
    }

    fn match_color_since(&self, target: Lab, started: Instant) -> Result<Match> {
        self.config.validate()?;
        let MatchConfig {
            max_usages,
            candidate_limit,
            ..
        } = self.config;

        // An image is eligible while its usage count is below the cap
        let Some(usage_ceiling) = max_usages.checked_sub(1) else {
            return Err(MosaicError::PoolExhausted { max_usages });
        };

        loop {
            self.check_deadline(started)?;

            let candidates = self
                .pool
                .candidates_near(target, usage_ceiling, candidate_limit)?;
            if candidates.is_empty() {
                return Err(MosaicError::PoolExhausted { max_usages });
            }

            let ranked = rank_candidates(candidates, target, candidate_limit);
            for scored in ranked {
                self.check_deadline(started)?;
                let ScoredCandidate {
                    candidate,
                    distance,
                } = scored;

                if self.pool.claim(candidate.image_id, max_usages)? {
                    debug!(
                        "ab_distance {distance:.4}   rank {}   {}",
                        candidate.rank, candidate.filename
                    );
                    return Ok(Match {
                        image_id: candidate.image_id,
                        filename: candidate.filename,
                        rank: candidate.rank,
                        distance,
                        usage_count: candidate.usage_count,
                    });
                }
                trace!(
                    "Image {} reached its usage cap concurrently, trying next candidate",
                    candidate.image_id
                );
            }
        }
    }

    fn check_deadline(&self, started: Instant) -> Result<()> {
        if started.elapsed() > self.config.timeout {
            return Err(MosaicError::MatchTimeout {
                tile: None,
                budget_ms: self.config.timeout.as_millis(),
            });
        }
        Ok(())
    }
}
