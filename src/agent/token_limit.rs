//! 上下文超长错误识别
//!
//! 供应商的错误信息是自由文本，这里只做尽力而为的匹配：没匹配上就是 `(false, None)`，
//! 匹配上但提取不到数字就是 `(true, None)`，调用方需要自带兜底裁剪策略。

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

/// 无法得知具体超出量时的默认裁剪比例
pub const FALLBACK_REDUCTION: f64 = 0.5;

const MINOR_LIMIT: i64 = 1_000;
const CATASTROPHIC_LIMIT: i64 = 50_000;

const TOKEN_ERROR_PHRASES: &[&str] = &[
    "maximum context length",
    "context_length_exceeded",
    "token limit",
    "input too long",
    "reduce the length",
    "too many tokens",
    "max_tokens",
    "prompt is too long",
];

static TOKEN_ERROR_RE: Lazy<Regex> = Lazy::new(|| {
    let alternation = TOKEN_ERROR_PHRASES
        .iter()
        .map(|p| regex::escape(p))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i)(?:{})", alternation))
        .expect("token error phrases are valid regex")
});

/// (正则, limit 所在分组, used 所在分组)
static QUANTITY_PATTERNS: Lazy<Vec<(Regex, usize, usize)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"(?is)maximum context length is\s+(\d+)\s+tokens.*?(\d+)\s+input tokens")
                .expect("valid regex"),
            1,
            2,
        ),
        (
            Regex::new(
                r"(?is)maximum context length is\s+(\d+)\s+tokens.*?resulted in\s+(\d+)\s+tokens",
            )
            .expect("valid regex"),
            1,
            2,
        ),
        (
            Regex::new(r"(?i)prompt is too long:\s*(\d+)\s+tokens\s*>\s*(\d+)\s+maximum")
                .expect("valid regex"),
            2,
            1,
        ),
    ]
});

/// 从错误信息中提取的上下文用量
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenLimitInfo {
    pub limit: i64,
    pub used: i64,
    pub overflow: i64,
}

impl TokenLimitInfo {
    pub fn new(limit: i64, used: i64) -> Self {
        TokenLimitInfo {
            limit,
            used,
            overflow: used - limit,
        }
    }

    /// 需要裁掉的比例：overflow / used，used 为 0 时取默认值
    pub fn reduction_needed(&self) -> f64 {
        if self.used > 0 {
            self.overflow as f64 / self.used as f64
        } else {
            FALLBACK_REDUCTION
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverflowSeverity {
    Unknown,
    Minor,
    Major,
    Catastrophic,
}

impl OverflowSeverity {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverflowSeverity::Unknown => "unknown",
            OverflowSeverity::Minor => "minor",
            OverflowSeverity::Major => "major",
            OverflowSeverity::Catastrophic => "catastrophic",
        }
    }
}

impl fmt::Display for OverflowSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub is_token_error: bool,
    pub info: Option<TokenLimitInfo>,
}

/// 错误分类接口，便于替换为基于结构化错误码的实现
pub trait ErrorClassifier {
    fn classify(&self, raw: &str) -> Classification;
}

/// 基于文本模式的默认实现
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternClassifier;

impl PatternClassifier {
    fn extract(raw: &str) -> Option<TokenLimitInfo> {
        QUANTITY_PATTERNS.iter().find_map(|(re, limit_group, used_group)| {
            let caps = re.captures(raw)?;
            let limit = caps.get(*limit_group)?.as_str().parse().ok()?;
            let used = caps.get(*used_group)?.as_str().parse().ok()?;
            Some(TokenLimitInfo::new(limit, used))
        })
    }
}

impl ErrorClassifier for PatternClassifier {
    fn classify(&self, raw: &str) -> Classification {
        if !TOKEN_ERROR_RE.is_match(raw) {
            return Classification::default();
        }

        Classification {
            is_token_error: true,
            info: Self::extract(raw),
        }
    }
}

/// 使用默认分类器解析错误信息
pub fn parse(error_text: &str) -> (bool, Option<TokenLimitInfo>) {
    let c = PatternClassifier.classify(error_text);
    (c.is_token_error, c.info)
}

pub fn classify_overflow(info: Option<&TokenLimitInfo>) -> OverflowSeverity {
    match info {
        None => OverflowSeverity::Unknown,
        Some(info) if info.overflow < MINOR_LIMIT => OverflowSeverity::Minor,
        Some(info) if info.overflow < CATASTROPHIC_LIMIT => OverflowSeverity::Major,
        Some(_) => OverflowSeverity::Catastrophic,
    }
}

/// 重试时应保留的最近消息条数
///
/// 裁剪比例取 `reduction_needed()`（夹在 [0, 1]），无信息时取 `FALLBACK_REDUCTION`；
/// 只要原窗口非空，至少保留 1 条。
pub fn shrink_window(window: usize, info: Option<&TokenLimitInfo>) -> usize {
    if window == 0 {
        return 0;
    }

    let reduction = info
        .map(TokenLimitInfo::reduction_needed)
        .unwrap_or(FALLBACK_REDUCTION)
        .clamp(0.0, 1.0);
    let keep = (window as f64 * (1.0 - reduction)).floor() as usize;
    keep.clamp(1, window)
}
