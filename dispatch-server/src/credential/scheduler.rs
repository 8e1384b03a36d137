//! 交付码再生调度器
//!
//! 固定间隔扫描仍在配送中、交付码缺失或已过期的子订单，重新签发一个
//! 新码并尽力通知顾客。配送员半路丢码时顾客无需察觉即可恢复。
//!
//! 注册为后台 Periodic 任务，由 `CancellationToken` 优雅停止。扫描期间
//! 被并发完成的子订单直接跳过（delivered_at 已置位或版本写入失败），
//! 下个周期自然重试。

use std::sync::Arc;
use std::time::Duration;

use shared::models::SubOrderStatus;
use shared::util::now_millis;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;
use tokio_util::sync::CancellationToken;

use super::sender::{CodeSender, send_best_effort};
use crate::db::repository::OrderRepository;
use crate::fulfillment::{FulfillmentResult, status_changed_event};
use crate::notify::{NotificationBus, notify};
use crate::credential::mint_code;

/// 交付码再生调度器
pub struct CodeRegenScheduler {
    db: Surreal<Db>,
    bus: Arc<dyn NotificationBus>,
    sender: Arc<dyn CodeSender>,
    ttl_minutes: i64,
    interval: Duration,
    shutdown: CancellationToken,
}

impl CodeRegenScheduler {
    pub fn new(
        db: Surreal<Db>,
        bus: Arc<dyn NotificationBus>,
        sender: Arc<dyn CodeSender>,
        ttl_minutes: i64,
        interval: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            db,
            bus,
            sender,
            ttl_minutes,
            interval,
            shutdown,
        }
    }

    /// 主循环：周期触发直到收到 shutdown 信号
    pub async fn run(self) {
        tracing::info!(
            interval_secs = self.interval.as_secs(),
            "Code regeneration scheduler started"
        );

        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    tracing::info!("Code regeneration scheduler stopped");
                    return;
                }
            }

            match self.tick().await {
                Ok(0) => tracing::debug!("Code regeneration tick: nothing stale"),
                Ok(n) => tracing::info!(regenerated = n, "Code regeneration tick complete"),
                // 失败只记日志，下个周期重试
                Err(e) => tracing::error!(error = %e, "Code regeneration tick failed"),
            }
        }
    }

    /// 单次扫描。返回重新签发的数量。
    pub async fn tick(&self) -> FulfillmentResult<usize> {
        let repo = OrderRepository::new(self.db.clone());
        let candidates = repo
            .find_with_sub_order_status(SubOrderStatus::OutForDelivery)
            .await?;

        let mut regenerated = 0;
        for order in candidates {
            let now = now_millis();
            let mut order = order;
            let expected = order.version;

            // 精确过滤在内存中做：配送中、未交付、码缺失或已过期
            let mut issued = Vec::new();
            for sub in &mut order.sub_orders {
                if sub.status == SubOrderStatus::OutForDelivery
                    && sub.delivered_at.is_none()
                    && !sub.has_live_code(now)
                {
                    let (code, expires_at) = mint_code(self.ttl_minutes, now);
                    sub.confirmation_code = Some(code.clone());
                    sub.code_expires_at = Some(expires_at);
                    sub.code_issued_at = Some(now);
                    issued.push((sub.sub_order_id.clone(), code, expires_at));
                }
            }
            if issued.is_empty() {
                continue;
            }

            order.version += 1;
            match repo.save_versioned(&order, expected).await? {
                Some(saved) => {
                    for (sub_order_id, code, expires_at) in issued {
                        send_best_effort(
                            self.sender.as_ref(),
                            &saved.customer,
                            &saved.customer_name,
                            &code,
                            expires_at,
                        )
                        .await;
                        if let Some(sub) = saved.sub_order(&sub_order_id) {
                            notify(
                                self.bus.as_ref(),
                                &saved.customer,
                                status_changed_event(&saved, sub),
                            )
                            .await;
                        }
                        tracing::info!(
                            order = %saved.id_str(),
                            sub_order = %sub_order_id,
                            "Regenerated confirmation code for stalled delivery"
                        );
                        regenerated += 1;
                    }
                }
                None => {
                    // 并发修改（多半是刚被核销），跳过，下个周期再看
                    tracing::debug!(
                        order = %order.id_str(),
                        "Skipping order mutated during regeneration scan"
                    );
                }
            }
        }

        Ok(regenerated)
    }
}
