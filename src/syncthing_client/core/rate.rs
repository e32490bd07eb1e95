use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::syncthing_client::models::ConnectionSample;

/// One cumulative byte counter reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSample {
    pub bytes: i64,
    pub at: DateTime<Utc>,
}

/// Bytes per second between two readings of the same counter.
///
/// Returns 0 while there is no prior reading (`before.bytes == 0`) and when
/// less than a whole second separates the readings.
pub fn rate(before: ByteSample, after: ByteSample) -> i64 {
    if before.bytes == 0 {
        return 0;
    }
    let elapsed = (after.at - before.at).num_seconds();
    if elapsed == 0 {
        return 0;
    }
    (after.bytes - before.bytes) / elapsed
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Throughput {
    pub in_bytes_per_sec: i64,
    pub out_bytes_per_sec: i64,
}

/// Inbound and outbound rates between two samples of the same target.
pub fn throughput(previous: Option<ConnectionSample>, current: Option<ConnectionSample>) -> Throughput {
    let (Some(previous), Some(current)) = (previous, current) else {
        return Throughput::default();
    };
    Throughput {
        in_bytes_per_sec: rate(
            ByteSample {
                bytes: previous.in_bytes_total,
                at: previous.at,
            },
            ByteSample {
                bytes: current.in_bytes_total,
                at: current.at,
            },
        ),
        out_bytes_per_sec: rate(
            ByteSample {
                bytes: previous.out_bytes_total,
                at: previous.at,
            },
            ByteSample {
                bytes: current.out_bytes_total,
                at: current.at,
            },
        ),
    }
}
