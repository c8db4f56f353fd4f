// Copyright 2023 Datafuse Labs.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Write;

const MICROS_PER_SEC: i64 = 1_000_000;
const SECS_PER_DAY: i64 = 86_400;

/// A date/time scalar supplied by the host system.
///
/// These never come out of JSON text; hosts put them into the value model
/// directly, and the binary encoder stores their ISO-8601 rendering as a
/// plain string entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Datetime {
    /// Days since 1970-01-01.
    Date { days: i32 },
    /// Microseconds since midnight.
    Time { micros: i64 },
    /// Microseconds since the Unix epoch, zone-less.
    Timestamp { micros: i64 },
    /// Microseconds since the Unix epoch plus the UTC offset to render with.
    TimestampTz { micros: i64, offset_secs: i32 },
}

impl Display for Datetime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Datetime::Date { days } => write_date(f, *days),
            Datetime::Time { micros } => write_time(f, *micros),
            Datetime::Timestamp { micros } => {
                let (days, day_micros) = split_days(*micros);
                write_date(f, days)?;
                f.write_char('T')?;
                write_time(f, day_micros)
            }
            Datetime::TimestampTz { micros, offset_secs } => {
                let local = micros + *offset_secs as i64 * MICROS_PER_SEC;
                let (days, day_micros) = split_days(local);
                write_date(f, days)?;
                f.write_char('T')?;
                write_time(f, day_micros)?;
                if *offset_secs == 0 {
                    f.write_char('Z')
                } else {
                    let sign = if *offset_secs < 0 { '-' } else { '+' };
                    let abs = offset_secs.unsigned_abs();
                    write!(f, "{sign}{:02}:{:02}", abs / 3600, abs % 3600 / 60)
                }
            }
        }
    }
}

fn split_days(micros: i64) -> (i32, i64) {
    let days = micros.div_euclid(SECS_PER_DAY * MICROS_PER_SEC);
    let rem = micros.rem_euclid(SECS_PER_DAY * MICROS_PER_SEC);
    (days as i32, rem)
}

fn write_date(f: &mut Formatter<'_>, days: i32) -> std::fmt::Result {
    let (year, month, day) = civil_from_days(days);
    write!(f, "{year:04}-{month:02}-{day:02}")
}

fn write_time(f: &mut Formatter<'_>, micros: i64) -> std::fmt::Result {
    let secs = micros / MICROS_PER_SEC;
    let sub = micros % MICROS_PER_SEC;
    write!(f, "{:02}:{:02}:{:02}", secs / 3600, secs % 3600 / 60, secs % 60)?;
    if sub != 0 {
        let mut frac = format!(".{sub:06}");
        while frac.ends_with('0') {
            frac.pop();
        }
        f.write_str(&frac)?;
    }
    Ok(())
}

/// Gregorian date from days since the epoch (Howard Hinnant's algorithm).
fn civil_from_days(days: i32) -> (i32, u32, u32) {
    let z = days as i64 + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let year = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = if month <= 2 { year + 1 } else { year };
    (year as i32, month, day)
}
