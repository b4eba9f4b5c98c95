//! Access decision manager
//!
//! Aggregates voter opinions per attribute under one of three strategies.
//! An attribute for which no voter has an opinion (no supporting voter, or
//! every supporting voter abstained) is always denied.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::{SecurityError, SecurityResult};
use super::token::Token;
use super::voter::{Subject, VoteResult, Voter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStrategy {
    /// At least one grant
    #[default]
    Affirmative,
    /// More grants than denials
    Consensus,
    /// At least one grant and no denial
    Unanimous,
}

impl DecisionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStrategy::Affirmative => "affirmative",
            DecisionStrategy::Consensus => "consensus",
            DecisionStrategy::Unanimous => "unanimous",
        }
    }
}

impl FromStr for DecisionStrategy {
    type Err = SecurityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "affirmative" => Ok(DecisionStrategy::Affirmative),
            "consensus" => Ok(DecisionStrategy::Consensus),
            "unanimous" => Ok(DecisionStrategy::Unanimous),
            other => Err(SecurityError::InvalidConfiguration(format!(
                "unknown access decision strategy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for DecisionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct VoteTally {
    granted: usize,
    denied: usize,
}

impl VoteTally {
    fn allows(&self, strategy: DecisionStrategy) -> bool {
        if self.granted == 0 && self.denied == 0 {
            return false;
        }
        match strategy {
            DecisionStrategy::Affirmative => self.granted > 0,
            DecisionStrategy::Consensus => self.granted > self.denied,
            DecisionStrategy::Unanimous => self.denied == 0 && self.granted > 0,
        }
    }
}

#[derive(Clone)]
pub struct AccessDecisionManager {
    strategy: DecisionStrategy,
    voters: Vec<Arc<dyn Voter>>,
}

impl AccessDecisionManager {
    pub fn new(strategy: DecisionStrategy, voters: Vec<Arc<dyn Voter>>) -> Self {
        Self { strategy, voters }
    }

    /// Build from a strategy name, rejecting unknown names
    pub fn from_strategy_name(name: &str, voters: Vec<Arc<dyn Voter>>) -> SecurityResult<Self> {
        Ok(Self::new(name.parse()?, voters))
    }

    pub fn strategy(&self) -> DecisionStrategy {
        self.strategy
    }

    /// Copy of the voter list
    pub fn voters(&self) -> Vec<Arc<dyn Voter>> {
        self.voters.clone()
    }

    /// Whether the token is granted a single attribute
    pub fn decide(&self, token: &Token, attribute: &str, subject: Subject<'_>) -> bool {
        let mut tally = VoteTally::default();
        for voter in self.voters.iter().filter(|v| v.supports(attribute, subject)) {
            match voter.vote(token, attribute, subject) {
                VoteResult::Granted => tally.granted += 1,
                VoteResult::Denied => tally.denied += 1,
                VoteResult::Abstain => {}
            }
        }
        tally.allows(self.strategy)
    }

    /// Every attribute must be granted; stops at the first denial
    pub fn decide_all<S: AsRef<str>>(
        &self,
        token: &Token,
        attributes: &[S],
        subject: Subject<'_>,
    ) -> SecurityResult<()> {
        for attribute in attributes {
            if !self.decide(token, attribute.as_ref(), subject) {
                log::debug!(
                    "Access denied for '{}' on attribute '{}' ({})",
                    token.user_identifier(),
                    attribute.as_ref(),
                    self.strategy
                );
                return Err(SecurityError::Forbidden);
            }
        }
        Ok(())
    }

    /// At least one attribute must be granted
    pub fn decide_any<S: AsRef<str>>(
        &self,
        token: &Token,
        attributes: &[S],
        subject: Subject<'_>,
    ) -> SecurityResult<()> {
        if attributes.iter().any(|attribute| self.decide(token, attribute.as_ref(), subject)) {
            Ok(())
        } else {
            Err(SecurityError::Forbidden)
        }
    }
}

impl fmt::Debug for AccessDecisionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessDecisionManager")
            .field("strategy", &self.strategy)
            .field("voters", &self.voters.len())
            .finish()
    }
}
