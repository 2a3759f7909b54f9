// ストリームエンジンのトレイト定義
// 全ての抽象化インターフェースを定義

use super::types::{ConsumerStatus, LaunchReport, ProductionReport, Signal};
use mockall::automock;

/// データ供給元の契約
///
/// 生産ループ終了後に Producer ワーカーから一度だけ close() が呼ばれる。
#[automock]
pub trait ObjectProducer: Send {
    /// 資源の解放（失敗はログに記録されるだけで伝播しない）
    fn close(&mut self) -> anyhow::Result<()> {
        Ok(())
    }
}

/// ストリームが次の信号を引き出す元
#[automock]
pub trait ItemSource<T: Send + 'static>: Send {
    /// 次の信号をブロッキングで取得する
    ///
    /// 供給側が消えた場合も End を返すこと
    fn pull(&mut self) -> Signal<T>;
}

/// 単一Consumer向けのブロッキングカーソル
pub trait ObjectStream<T>: Send {
    /// 次のアイテムを消費する。終端以降は常に None
    fn next_item(&mut self) -> Option<T>;

    /// 次のアイテムを消費せずに参照する
    fn peek_next(&mut self) -> Option<&T>;

    /// 未初期化なら true、以降は先読みスロットにアイテムがあるか
    fn has_next(&self) -> bool;

    /// 終端を内部的に観測済みか
    fn is_closed(&self) -> bool;

    /// 購読を解放する。失敗しても呼び出し側には伝播しない
    fn close(&mut self);
}

/// エンジン設定を抽象化するトレイト
#[automock]
pub trait EngineConfig: Send + Sync {
    /// 購読ごとのバッファ深さ
    fn channel_depth(&self) -> usize;

    /// ワーカースレッド名の接頭辞
    fn thread_name_prefix(&self) -> String;
}

// EngineConfig for Box<dyn EngineConfig>
impl EngineConfig for Box<dyn EngineConfig> {
    fn channel_depth(&self) -> usize {
        self.as_ref().channel_depth()
    }

    fn thread_name_prefix(&self) -> String {
        self.as_ref().thread_name_prefix()
    }
}

/// launch() の進行を通知するトレイト
///
/// Consumer スレッドからも呼ばれるため Sync が必要
#[automock]
pub trait LaunchObserver: Send + Sync {
    /// 全ワーカー起動前
    fn on_launch(&self, consumers: usize);

    /// Producer ワーカー終了時
    fn on_production_finished(&self, report: &ProductionReport);

    /// 各 Consumer ワーカー終了時
    fn on_consumer_finished(&self, status: &ConsumerStatus);

    /// 全ワーカー合流後
    fn on_completed(&self, report: &LaunchReport);
}
