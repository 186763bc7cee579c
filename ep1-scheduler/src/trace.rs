use std::io::BufRead;

use crate::error::{Error, Result};
use crate::job::JobSpec;

/// Admission predicate applied against the current simulated instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitMode {
    /// `t0 == tau` — used by SRTN and round-robin.
    Now,
    /// `t0 <= tau` — used by FCFS.
    NowOrBefore,
}

const MAX_NAME_LEN: usize = 29;

/// Incrementally parses trace lines, one job per line, in non-decreasing
/// `t0` order. A line read ahead of the current admission instant is held
/// in `pending` and replayed on the next call, emulating the source's
/// rewind-on-mismatch behavior without raw seeks.
pub struct TraceReader<R> {
    lines: std::io::Lines<R>,
    pending: Option<JobSpec>,
    line_no: usize,
    exhausted: bool,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        TraceReader {
            lines: reader.lines(),
            pending: None,
            line_no: 0,
            exhausted: false,
        }
    }

    fn parse_line(line_no: usize, line: &str) -> Result<Option<JobSpec>> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let fields: Vec<&str> = trimmed.split_whitespace().collect();
        if fields.len() != 4 {
            return Err(Error::InvalidTrace {
                line_no,
                detail: format!("expected 4 fields, got {}", fields.len()),
            });
        }
        let name = fields[0].to_string();
        if name.len() > MAX_NAME_LEN {
            return Err(Error::InvalidTrace {
                line_no,
                detail: format!("name longer than {MAX_NAME_LEN} bytes"),
            });
        }
        let parse_int = |field: &str, label: &str| -> Result<i64> {
            field.parse::<i64>().map_err(|_| Error::InvalidTrace {
                line_no,
                detail: format!("invalid {label}: {field}"),
            })
        };
        let t0 = parse_int(fields[1], "t0")?;
        let dt = parse_int(fields[2], "dt")?;
        let deadline = parse_int(fields[3], "deadline")?;
        if dt < 0 {
            return Err(Error::InvalidTrace {
                line_no,
                detail: "dt must be non-negative".to_string(),
            });
        }
        Ok(Some(JobSpec { name, t0, dt, deadline }))
    }

    fn next_spec(&mut self) -> Result<Option<JobSpec>> {
        if let Some(spec) = self.pending.take() {
            return Ok(Some(spec));
        }
        loop {
            match self.lines.next() {
                None => {
                    self.exhausted = true;
                    return Ok(None);
                }
                Some(line) => {
                    self.line_no += 1;
                    let line = line?;
                    if let Some(spec) = Self::parse_line(self.line_no, &line)? {
                        return Ok(Some(spec));
                    }
                    // Blank line: keep scanning for the next real entry.
                }
            }
        }
    }

    /// Consumes every successive line whose `t0` matches `mode` against
    /// `tau`, restoring the first non-matching line for a later call.
    pub fn admit_at(&mut self, tau: i64, mode: AdmitMode) -> Result<Vec<JobSpec>> {
        let mut admitted = Vec::new();
        loop {
            match self.next_spec()? {
                None => break,
                Some(spec) => {
                    let matches = match mode {
                        AdmitMode::Now => spec.t0 == tau,
                        AdmitMode::NowOrBefore => spec.t0 <= tau,
                    };
                    if matches {
                        admitted.push(spec);
                    } else {
                        self.pending = Some(spec);
                        break;
                    }
                }
            }
        }
        Ok(admitted)
    }

    /// True once the stream has no buffered or remaining lines.
    pub fn is_exhausted(&self) -> bool {
        self.exhausted && self.pending.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn reader(text: &str) -> TraceReader<Cursor<&[u8]>> {
        TraceReader::new(Cursor::new(text.as_bytes()))
    }

    #[test]
    fn admits_matching_lines_and_holds_back_the_rest() {
        let mut r = reader("A 0 3 10\nB 1 2 10\nC 2 1 10\n");
        let at0 = r.admit_at(0, AdmitMode::Now).unwrap();
        assert_eq!(at0.len(), 1);
        assert_eq!(at0[0].name, "A");

        let still_at0 = r.admit_at(0, AdmitMode::Now).unwrap();
        assert!(still_at0.is_empty());

        let at1 = r.admit_at(1, AdmitMode::Now).unwrap();
        assert_eq!(at1.len(), 1);
        assert_eq!(at1[0].name, "B");
    }

    #[test]
    fn now_or_before_admits_everything_up_to_tau() {
        let mut r = reader("A 0 3 10\nB 1 2 10\nC 2 1 10\n");
        let admitted = r.admit_at(1, AdmitMode::NowOrBefore).unwrap();
        assert_eq!(admitted.iter().map(|j| j.name.clone()).collect::<Vec<_>>(), vec!["A", "B"]);
    }

    #[test]
    fn exhaustion_tracks_both_stream_and_pending() {
        let mut r = reader("A 0 1 5\n");
        assert!(!r.is_exhausted());
        let _ = r.admit_at(0, AdmitMode::Now).unwrap();
        assert!(r.is_exhausted());
    }

    #[test]
    fn rejects_malformed_lines() {
        let mut r = reader("A 0 x 10\n");
        let err = r.admit_at(0, AdmitMode::Now).unwrap_err();
        assert!(matches!(err, Error::InvalidTrace { .. }));
    }

    #[test]
    fn rejects_overlong_names() {
        let long_name = "x".repeat(30);
        let mut r = reader(&format!("{long_name} 0 1 5\n"));
        let err = r.admit_at(0, AdmitMode::Now).unwrap_err();
        assert!(matches!(err, Error::InvalidTrace { .. }));
    }
}
