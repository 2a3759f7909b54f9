// テストユーティリティとフィクスチャ
// 統合テスト共通の Producer 実装とヘルパー

pub mod producers;

// 公開API
pub use producers::*;

use crossbeam_channel::{after, select, tick};
use fanout_stream::{ChannelStream, ObjectStream};
use std::time::Duration;

/// "item0,item1," 形式で連結する変換関数
pub fn concat_items(stream: &mut ChannelStream<String>) -> String {
    let mut out = String::new();
    while let Some(item) = stream.next_item() {
        out.push_str(&item);
        out.push(',');
    }
    out
}

/// "item0".."itemN-1" の期待値
pub fn expected_items(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("item{i}")).collect()
}

/// 条件が成立するまで最大 `timeout` 待つ（成立したら true）
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
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
