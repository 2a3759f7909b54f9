// 単体テスト共通ヘルパー

use crossbeam_channel::{after, select, tick};
use std::time::Duration;

/// 条件が成立するまで最大 `timeout` 待つ（成立したら true）
pub(crate) fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = after(timeout);
    let ticker = tick(Duration::from_millis(2));
    loop {
        if condition() {
            return true;
        }
        select! {
            recv(deadline) -> _ => return condition(),
            recv(ticker) -> _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_wait_until_observes_other_thread() {
        let flag = Arc::new(AtomicBool::new(false));
        let setter = {
            let flag = Arc::clone(&flag);
            thread::spawn(move || flag.store(true, Ordering::SeqCst))
        };

        assert!(wait_until(Duration::from_secs(5), || flag.load(Ordering::SeqCst)));
        setter.join().unwrap();
    }

    #[test]
    fn test_wait_until_gives_up_at_deadline() {
        assert!(!wait_until(Duration::from_millis(20), || false));
    }
}
