//! 替换策略
//!
//! 最少访问（least-touched）而不是 LRU：`touch_count` 只在命中时递增、改绑时重置，
//! 因此选中的是历史上访问次数最少的块。计数相同时先扫描到的行胜出，
//! 因为只有严格更小的计数才会替换候选。

use super::CacheLine;

/// 扫描结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineChoice {
    /// 目标块已在第 i 行
    Hit(usize),
    /// 目标块不在池中，第 i 行是牺牲行
    Victim(usize),
}

/// 为 `target` 扫描整个缓存池
///
/// `lines` 不能为空（由 [`CacheConfig::validate`](super::CacheConfig::validate) 保证）。
pub fn select_line(lines: &[CacheLine], target: u32) -> LineChoice {
    let mut victim = 0;
    for (i, line) in lines.iter().enumerate() {
        if line.bound_block == Some(target) {
            return LineChoice::Hit(i);
        }
        if line.touch_count < lines[victim].touch_count {
            victim = i;
        }
    }
    LineChoice::Victim(victim)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bound(blockno: u32, touch_count: u32) -> CacheLine {
        CacheLine {
            bound_block: Some(blockno),
            touch_count,
        }
    }

    #[test]
    fn test_hit() {
        let lines = [bound(10, 1), bound(11, 9), bound(12, 1)];
        assert_eq!(select_line(&lines, 11), LineChoice::Hit(1));
    }

    #[test]
    fn test_unbound_lines_fill_in_order() {
        let mut lines = [CacheLine::default(); 4];
        assert_eq!(select_line(&lines, 10), LineChoice::Victim(0));
        lines[0].bind(10);
        assert_eq!(select_line(&lines, 11), LineChoice::Victim(1));
        lines[1].bind(11);
        assert_eq!(select_line(&lines, 12), LineChoice::Victim(2));
    }

    #[test]
    fn test_tie_goes_to_first_line() {
        let lines = [bound(10, 1), bound(11, 1), bound(12, 1), bound(13, 1)];
        assert_eq!(select_line(&lines, 14), LineChoice::Victim(0));
    }

    #[test]
    fn test_least_touched_not_least_recent() {
        // 10 被访问了三次，11/12/13 各一次，11 是第一个最小值
        let lines = [bound(10, 3), bound(11, 1), bound(12, 1), bound(13, 1)];
        assert_eq!(select_line(&lines, 14), LineChoice::Victim(1));
    }

    #[test]
    fn test_hot_line_is_never_victim() {
        let mut lines = [bound(10, 1), bound(11, 50), bound(12, 1)];
        for next in 13..40 {
            match select_line(&lines, next) {
                LineChoice::Victim(i) => {
                    assert_ne!(i, 1);
                    lines[i].bind(next);
                }
                LineChoice::Hit(_) => unreachable!(),
            }
        }
        assert_eq!(lines[1].bound_block, Some(11));
    }

    #[test]
    fn test_touch_saturates() {
        let mut line = bound(5, u32::MAX);
        line.touch();
        assert_eq!(line.touch_count, u32::MAX);
        line.bind(6);
        assert_eq!(line, bound(6, 1));
    }
}
