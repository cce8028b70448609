//! Threat Score History - bounded series for the score chart
//!
//! Flow:
//! 1. Every successful poll while monitoring appends one point
//! 2. The oldest point is evicted once the capacity is exceeded
//! 3. The series is cleared when monitoring stops

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One chart sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Client wall-clock label, `HH:MM:SS`
    pub time: String,
    pub score: f64,
}

impl HistoryPoint {
    pub fn at(now: DateTime<Local>, score: f64) -> Self {
        Self {
            time: now.format("%H:%M:%S").to_string(),
            score,
        }
    }
}

/// Append-only ring of [`HistoryPoint`]s, oldest first
#[derive(Debug, Clone)]
pub struct HistoryBuffer {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

// ============================================================================
// OPERATIONS
// ============================================================================

impl HistoryBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a point, evicting from the front until within capacity
    pub fn push(&mut self, point: HistoryPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    /// Replace the whole series with a single starting point
    pub fn reset_to(&mut self, point: HistoryPoint) {
        self.points.clear();
        self.points.push_back(point);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<HistoryPoint> {
        self.points.iter().cloned().collect()
    }
}
