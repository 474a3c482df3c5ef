use crate::types::{Source, SourceKind};

const FOOTER_HEADER: &str = "\n\n---\n**Sources:**\n";

/// 来源登记 - 生成过程中收集引用，回答结束后统一渲染脚注
///
/// 编号在一轮内从 1 开始连续递增；轮次边界由调用方通过 `clear()` 标记。
#[derive(Debug, Default)]
pub struct SourceRegistry {
    sources: Vec<Source>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        SourceRegistry::default()
    }

    /// 登记一条来源，返回其编号；`detail` 为空串时不显示
    pub fn add(&mut self, kind: SourceKind, label: &str, detail: &str) -> usize {
        let index = self.sources.len() + 1;
        self.sources.push(Source {
            index,
            kind,
            label: label.to_string(),
            detail: (!detail.is_empty()).then(|| detail.to_string()),
        });
        index
    }

    /// 渲染脚注；无来源时返回空串
    pub fn format_footer(&self) -> String {
        if self.sources.is_empty() {
            return String::new();
        }

        let lines: Vec<String> = self
            .sources
            .iter()
            .map(|s| match &s.detail {
                Some(detail) => format!("[{}] {} — {}", s.index, s.label, detail),
                None => format!("[{}] {}", s.index, s.label),
            })
            .collect();

        format!("{}{}", FOOTER_HEADER, lines.join("\n"))
    }

    pub fn clear(&mut self) {
        self.sources.clear();
    }

    pub fn has_sources(&self) -> bool {
        !self.sources.is_empty()
    }

    pub fn sources(&self) -> Vec<Source> {
        self.sources.clone()
    }

    pub fn count(&self) -> usize {
        self.sources.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indices_start_at_one_and_increase() {
        let mut registry = SourceRegistry::new();
        let indices: Vec<usize> = (0..5)
            .map(|i| registry.add(SourceKind::Note, &format!("n{}", i), ""))
            .collect();
        assert_eq!(indices, vec![1, 2, 3, 4, 5]);
        assert_eq!(registry.count(), 5);
    }

    #[test]
    fn empty_registry_has_no_footer() {
        let registry = SourceRegistry::new();
        assert_eq!(registry.format_footer(), "");
        assert!(!registry.has_sources());
    }

    #[test]
    fn footer_lists_sources_in_order() {
        let mut registry = SourceRegistry::new();
        registry.add(SourceKind::Note, "N1", "");
        registry.add(SourceKind::File, "F1", "path.txt");

        let footer = registry.format_footer();
        assert!(footer.contains("---"));
        assert!(footer.contains("**Sources:**"));
        let first = footer.find("[1] N1").unwrap();
        let second = footer.find("[2] F1 — path.txt").unwrap();
        assert!(first < second);
        assert!(!footer.contains("[1] N1 —"));
    }

    #[test]
    fn clear_resets_for_next_turn() {
        let mut registry = SourceRegistry::new();
        registry.add(SourceKind::Entity, "Alice", "");
        registry.add(SourceKind::Core, "persona", "");
        registry.clear();

        assert!(!registry.has_sources());
        assert_eq!(registry.format_footer(), "");
        assert_eq!(registry.add(SourceKind::Archive, "2024 log", ""), 1);
    }

    #[test]
    fn sources_returns_a_copy() {
        let mut registry = SourceRegistry::new();
        registry.add(SourceKind::File, "notes.md", "line 3");

        let mut copy = registry.sources();
        copy.clear();
        assert_eq!(registry.count(), 1);
        assert_eq!(registry.sources()[0].detail.as_deref(), Some("line 3"));
    }
}
