//! 抓取周期 - daily / weekly / monthly / manual
//!
//! 一个周期由 (模式, 周期字符串) 唯一标识，例如 `daily/2026-02-19`、
//! `weekly/2026-W08`、`monthly/2026-02`。manual 模式用于手动提交，
//! 周期字符串取提交当天的日期。

use chrono::{Datelike, Duration, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 抓取模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Daily,
    Weekly,
    Monthly,
    Manual,
}

impl Mode {
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Daily => "daily",
            Mode::Weekly => "weekly",
            Mode::Monthly => "monthly",
            Mode::Manual => "manual",
        }
    }

    /// 该模式默认抓取的论文数上限
    pub fn default_limit(self) -> usize {
        match self {
            Mode::Daily => 3,
            Mode::Weekly | Mode::Monthly => 10,
            Mode::Manual => 1,
        }
    }

    /// 该模式当前周期的默认 key
    pub fn default_key(self) -> String {
        match self {
            Mode::Daily | Mode::Manual => today_key(),
            Mode::Weekly => current_week_key(),
            Mode::Monthly => current_month_key(),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 周期键：(模式, 周期字符串)，创建后不可变
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PeriodKey {
    pub mode: Mode,
    pub key: String,
}

impl PeriodKey {
    pub fn new(mode: Mode, key: impl Into<String>) -> Self {
        Self {
            mode,
            key: key.into(),
        }
    }

    /// 手动提交使用的周期：manual/<今天>
    pub fn manual_today() -> Self {
        Self::new(Mode::Manual, today_key())
    }

    /// HTML 内嵌链接使用的路径片段，如 `daily/2026-02-19`
    pub fn path(&self) -> String {
        format!("{}/{}", self.mode, self.key)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.mode, self.key)
    }
}

/// 当前日期 YYYY-MM-DD。daily 定时任务在 23:00 触发，取当天日期。
pub fn today_key() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// 当前年月 YYYY-MM。monthly 定时任务在 28 日 02:00 触发，取当月。
pub fn current_month_key() -> String {
    Local::now().format("%Y-%m").to_string()
}

/// 当前 ISO 周 YYYY-WNN。
///
/// ISO 8601：周一为第 1 天，周日为第 7 天（仍属于本周）。
/// weekly 定时任务在周日 02:00 触发，此时返回的是本周编号，正确。
pub fn current_week_key() -> String {
    let iso = Local::now().iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// 上一个完整 ISO 周 YYYY-WNN（仅在需要补抓历史数据时使用）。
/// 注意：若在周日调用，会得到上上周，请勿在定时任务中使用。
pub fn last_week_key() -> String {
    let now = Local::now();
    let last_mon = now - Duration::days(i64::from(now.weekday().num_days_from_monday()) + 7);
    let iso = last_mon.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

/// 统一的时间戳格式 YYYY-MM-DD HH:MM:SS
pub fn now_stamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trip() {
        assert_eq!(Mode::Daily.as_str(), "daily");
        assert_eq!(Mode::Manual.as_str(), "manual");

        let json = serde_json::to_string(&Mode::Weekly).unwrap();
        assert_eq!(json, "\"weekly\"");
        let back: Mode = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(back, Mode::Monthly);
    }

    #[test]
    fn default_limits() {
        assert_eq!(Mode::Daily.default_limit(), 3);
        assert_eq!(Mode::Weekly.default_limit(), 10);
        assert_eq!(Mode::Monthly.default_limit(), 10);
    }

    #[test]
    fn key_shapes() {
        let re_day = regex::Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
        let re_week = regex::Regex::new(r"^\d{4}-W\d{2}$").unwrap();
        let re_month = regex::Regex::new(r"^\d{4}-\d{2}$").unwrap();

        assert!(re_day.is_match(&today_key()));
        assert!(re_week.is_match(&current_week_key()));
        assert!(re_week.is_match(&last_week_key()));
        assert!(re_month.is_match(&current_month_key()));
    }

    #[test]
    fn period_path() {
        let p = PeriodKey::new(Mode::Daily, "2026-02-19");
        assert_eq!(p.path(), "daily/2026-02-19");
        assert_eq!(p.to_string(), "daily/2026-02-19");
    }
}
