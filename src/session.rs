//! Per-session reading pipeline.
//!
//! A [`ReadingSession`] owns everything that outlives a single request: the
//! rate-limit window, the reading cache, the random source and the current
//! reading. One session serves one user with at most one request in flight,
//! so nothing here is shared or locked.
//!
//! A request runs in two halves so callers can await the generation call
//! wherever suits them (the TUI spawns it, `ask` awaits inline):
//!
//! 1. [`ReadingSession::begin`] validates, rate-limits, draws and checks the
//!    cache, returning either a finished [`Reading`] or a [`PendingReading`].
//! 2. [`ReadingSession::finish`] takes the generation result, sanitizes it and
//!    stores it. A failed generation stores nothing.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::ReadingCache;
use crate::classifier::{Classification, Theme, classify};
use crate::config::LimitsConfig;
use crate::draw::{DrawnCard, Spread, draw};
use crate::error::{GenerateError, ReadingError};
use crate::fingerprint::{Fingerprint, fingerprint};
use crate::generator::Generator;
use crate::prompt::{PromptPayload, choose_opening, compose};
use crate::rate_limit::RateLimiter;
use crate::sanitize::sanitize;

pub const DEFAULT_MAX_QUESTION_CHARS: usize = 220;

/// A finished reading, ready to render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reading {
    pub question: String,
    pub theme: Theme,
    pub cards: Vec<DrawnCard>,
    pub text: String,
    /// Served from the cache without calling the generator.
    pub from_cache: bool,
}

/// A cache miss waiting for the generator.
#[derive(Debug, Clone)]
pub struct PendingReading {
    pub question: String,
    pub classification: Classification,
    pub cards: Vec<DrawnCard>,
    pub key: Fingerprint,
    pub prompt: PromptPayload,
}

/// Outcome of the first half of a request.
#[derive(Debug)]
pub enum Prepared {
    Ready(Reading),
    Pending(PendingReading),
}

pub struct ReadingSession {
    limiter: RateLimiter,
    cache: ReadingCache,
    rng: StdRng,
    max_question_chars: usize,
    current: Option<Reading>,
}

impl ReadingSession {
    pub fn new(limits: &LimitsConfig) -> Self {
        Self::with_rng(limits, StdRng::from_os_rng())
    }

    /// Build a session around a given random source (seeded in tests).
    pub fn with_rng(limits: &LimitsConfig, rng: StdRng) -> Self {
        Self {
            limiter: RateLimiter::new(
                limits.max_calls_per_minute,
                Duration::from_secs(limits.window_secs),
            ),
            cache: ReadingCache::new(Duration::from_secs(limits.cache_ttl_secs)),
            rng,
            max_question_chars: limits.max_question_chars,
            current: None,
        }
    }

    /// The most recent reading, if any.
    pub fn current(&self) -> Option<&Reading> {
        self.current.as_ref()
    }

    fn validate(&self, question: &str) -> Result<(), ReadingError> {
        if question.trim().is_empty() {
            return Err(ReadingError::EmptyQuestion);
        }
        if question.chars().count() > self.max_question_chars {
            return Err(ReadingError::QuestionTooLong {
                max: self.max_question_chars,
            });
        }
        Ok(())
    }

    /// Validation, then one slot from the rate limiter.
    fn admit(&mut self, question: &str, now: Instant) -> Result<(), ReadingError> {
        self.validate(question)?;
        self.limiter.try_acquire_at(now).inspect_err(|e| {
            if let ReadingError::RateLimited { max, window_secs } = e {
                warn!(
                    in_window = self.limiter.in_window(),
                    max,
                    window_secs,
                    "rate_limited"
                );
            }
        })
    }

    pub fn begin(&mut self, question: &str, spread: Spread) -> Result<Prepared, ReadingError> {
        self.begin_at(question, spread, Instant::now())
    }

    /// Validate, pass the rate gate, draw fresh cards and check the cache.
    pub fn begin_at(
        &mut self,
        question: &str,
        spread: Spread,
        now: Instant,
    ) -> Result<Prepared, ReadingError> {
        self.admit(question, now)?;

        let cards = draw(&mut self.rng, spread);
        debug!(
            spread = ?spread,
            cards = ?cards.iter().map(|c| c.card.index()).collect::<Vec<_>>(),
            "cards_drawn"
        );
        Ok(self.prepare(question, cards, now))
    }

    fn prepare(&mut self, question: &str, cards: Vec<DrawnCard>, now: Instant) -> Prepared {
        let classification = classify(question);
        let key = fingerprint(question, &cards);

        if let Some(text) = self.cache.get_at(&key, now) {
            info!(key = %key, theme = ?classification.theme, "reading_cache_hit");
            let reading = Reading {
                question: question.to_string(),
                theme: classification.theme,
                cards,
                text: text.to_string(),
                from_cache: true,
            };
            self.current = Some(reading.clone());
            return Prepared::Ready(reading);
        }

        let opening = choose_opening(&mut self.rng);
        let prompt = compose(&classification, &cards, opening, question);
        debug!(key = %key, theme = ?classification.theme, "reading_cache_miss");

        Prepared::Pending(PendingReading {
            question: question.to_string(),
            classification,
            cards,
            key,
            prompt,
        })
    }

    pub fn finish(
        &mut self,
        pending: PendingReading,
        generated: Result<String, GenerateError>,
    ) -> Result<Reading, ReadingError> {
        self.finish_at(pending, generated, Instant::now())
    }

    /// Sanitize and cache a generated reading. Errors leave the cache untouched.
    pub fn finish_at(
        &mut self,
        pending: PendingReading,
        generated: Result<String, GenerateError>,
        now: Instant,
    ) -> Result<Reading, ReadingError> {
        let raw = generated.inspect_err(|e| {
            warn!(key = %pending.key, error = %e, "generation_failed");
        })?;

        let text = sanitize(&raw);
        self.cache.put_at(pending.key, text.clone(), now);
        info!(
            key = %pending.key,
            theme = ?pending.classification.theme,
            chars = text.chars().count(),
            cached = self.cache.len(),
            "reading_generated"
        );

        let reading = Reading {
            question: pending.question,
            theme: pending.classification.theme,
            cards: pending.cards,
            text,
            from_cache: false,
        };
        self.current = Some(reading.clone());
        Ok(reading)
    }

    /// Run a whole request, awaiting the generator on a cache miss.
    pub async fn read(
        &mut self,
        generator: &dyn Generator,
        question: &str,
        spread: Spread,
    ) -> Result<Reading, ReadingError> {
        let prepared = self.begin(question, spread)?;
        self.complete(generator, prepared).await
    }

    async fn complete(
        &mut self,
        generator: &dyn Generator,
        prepared: Prepared,
    ) -> Result<Reading, ReadingError> {
        match prepared {
            Prepared::Ready(reading) => Ok(reading),
            Prepared::Pending(pending) => {
                let generated = generator
                    .generate(pending.prompt.system, &pending.prompt.user)
                    .await;
                self.finish(pending, generated)
            }
        }
    }
}
