// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Minimal reader for the Prometheus text exposition format.

use std::collections::HashMap;

/// Collect `name value` pairs from an exposition body.
///
/// Only lines that are not `#` comments and contain a space count. The name is
/// the text before the first space, the value the text up to the next one.
/// Anything else is skipped without error. A repeated name keeps its last value.
pub fn parse_exposition(body: &str) -> HashMap<String, String> {
    let mut metrics = HashMap::new();
    for line in body.lines() {
        if line.starts_with('#') || !line.contains(' ') {
            continue;
        }
        let mut parts = line.split(' ');
        if let (Some(name), Some(value)) = (parts.next(), parts.next()) {
            metrics.insert(name.to_owned(), value.to_owned());
        }
    }
    metrics
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
