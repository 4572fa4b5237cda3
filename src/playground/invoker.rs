//! Endpoint invocation
//!
//! 해석된 인자로 통합 메서드를 호출하고 소요 시간과 결과 또는 에러를 기록한다.
//! 호출 실패는 기록에 담길 뿐 세션을 끝내지 않는다.

use chrono::{DateTime, Local};
use serde::Serialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use super::endpoint::Endpoint;
use super::error::{PlaygroundError, PlaygroundResult};
use super::params::ResolvedArgs;
use super::session::Session;
use crate::errors::{CcxtError, CcxtResult};
use crate::types::{Exchange, ExchangeId, OrderSide, OrderType, Timeframe};

/// 한 번의 호출 기록
#[derive(Debug)]
pub struct InvocationRecord {
    pub exchange: ExchangeId,
    pub endpoint: Endpoint,
    pub args: ResolvedArgs,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
    pub outcome: PlaygroundResult<Value>,
    /// 디버그 모드에서만 채워지는 상세 에러
    pub trace: Option<String>,
}

impl InvocationRecord {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn payload(&self) -> Option<&Value> {
        self.outcome.as_ref().ok()
    }
}

fn to_value<T: Serialize>(result: CcxtResult<T>) -> CcxtResult<Value> {
    Ok(serde_json::to_value(result?)?)
}

/// 엔드포인트별 타입 있는 호출
async fn dispatch(
    client: &dyn Exchange,
    endpoint: Endpoint,
    args: &ResolvedArgs,
) -> PlaygroundResult<CcxtResult<Value>> {
    let result = match endpoint {
        Endpoint::LoadMarkets => to_value(client.load_markets(args.flag("reload")).await),
        Endpoint::FetchMarkets => to_value(client.fetch_markets().await),
        Endpoint::FetchTime => to_value(client.fetch_time().await),
        Endpoint::FetchStatus => to_value(client.fetch_status().await),
        Endpoint::FetchTicker => to_value(client.fetch_ticker(&args.text("symbol")?).await),
        Endpoint::FetchTickers => {
            let symbols = args.opt_list("symbols");
            to_value(client.fetch_tickers(symbols.as_deref()).await)
        }
        Endpoint::FetchOrderBook => {
            let symbol = args.text("symbol")?;
            to_value(client.fetch_order_book(&symbol, args.opt_u32("limit")?).await)
        }
        Endpoint::FetchTrades => {
            let symbol = args.text("symbol")?;
            let (since, limit) = (args.opt_i64("since")?, args.opt_u32("limit")?);
            to_value(client.fetch_trades(&symbol, since, limit).await)
        }
        Endpoint::FetchOhlcv => {
            let symbol = args.text("symbol")?;
            let timeframe = match args.opt_text("timeframe") {
                Some(_) => args.parsed::<Timeframe>("timeframe")?,
                None => Timeframe::Hour1,
            };
            let (since, limit) = (args.opt_i64("since")?, args.opt_u32("limit")?);
            to_value(client.fetch_ohlcv(&symbol, timeframe, since, limit).await)
        }
        Endpoint::FetchBalance => to_value(client.fetch_balance().await),
        Endpoint::FetchOrder => {
            let id = args.text("id")?;
            let symbol = args.opt_text("symbol");
            to_value(client.fetch_order(&id, symbol.as_deref()).await)
        }
        Endpoint::CancelOrder => {
            let id = args.text("id")?;
            let symbol = args.opt_text("symbol");
            to_value(client.cancel_order(&id, symbol.as_deref()).await)
        }
        Endpoint::FetchOpenOrders | Endpoint::FetchClosedOrders | Endpoint::FetchMyTrades => {
            let symbol = args.opt_text("symbol");
            let (since, limit) = (args.opt_i64("since")?, args.opt_u32("limit")?);
            match endpoint {
                Endpoint::FetchOpenOrders => {
                    to_value(client.fetch_open_orders(symbol.as_deref(), since, limit).await)
                }
                Endpoint::FetchClosedOrders => {
                    to_value(client.fetch_closed_orders(symbol.as_deref(), since, limit).await)
                }
                _ => to_value(client.fetch_my_trades(symbol.as_deref(), since, limit).await),
            }
        }
        Endpoint::CreateOrder => {
            let symbol = args.text("symbol")?;
            let order_type: OrderType = args.parsed("type")?;
            let side: OrderSide = args.parsed("side")?;
            let amount = args.decimal("amount")?;
            let price = args.opt_decimal("price")?;
            to_value(client.create_order(&symbol, order_type, side, amount, price).await)
        }
        Endpoint::FetchDeposits | Endpoint::FetchWithdrawals => {
            let code = args.opt_text("code");
            let (since, limit) = (args.opt_i64("since")?, args.opt_u32("limit")?);
            if endpoint == Endpoint::FetchDeposits {
                to_value(client.fetch_deposits(code.as_deref(), since, limit).await)
            } else {
                to_value(client.fetch_withdrawals(code.as_deref(), since, limit).await)
            }
        }
        Endpoint::FetchDepositAddress => {
            to_value(client.fetch_deposit_address(&args.text("code")?).await)
        }
    };
    Ok(result)
}

fn trace_of(err: &CcxtError) -> String {
    format!("{err:#?}")
}

/// 엔드포인트 호출
///
/// `debug`가 true이면 실패 시 상세 에러 구조를 `trace`에 담는다.
pub async fn invoke(
    session: &Session,
    endpoint: Endpoint,
    args: ResolvedArgs,
    debug: bool,
) -> InvocationRecord {
    let started_at = Local::now();
    let timer = Instant::now();
    debug!(exchange = %session.exchange(), %endpoint, "invoking");

    let (outcome, trace) = match dispatch(session.client(), endpoint, &args).await {
        Ok(Ok(value)) => (Ok(value), None),
        Ok(Err(err)) => {
            warn!(%endpoint, code = err.code(), "invocation failed");
            let trace = debug.then(|| trace_of(&err));
            (Err(PlaygroundError::invocation(endpoint.name(), &err)), trace)
        }
        Err(err) => (Err(err), None),
    };

    let elapsed = timer.elapsed();
    debug!(%endpoint, elapsed_ms = elapsed.as_millis() as u64, ok = outcome.is_ok(), "invocation finished");

    InvocationRecord {
        exchange: session.exchange(),
        endpoint,
        args,
        started_at,
        elapsed,
        outcome,
        trace,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ExchangeConfig;
    use crate::exchanges::Kraken;
    use crate::playground::session::Session;
    use serde_json::json;

    fn session() -> Session {
        let client = Kraken::new(ExchangeConfig::new()).unwrap();
        Session::new(ExchangeId::Kraken, None, Box::new(client))
    }

    #[tokio::test]
    async fn test_private_call_without_credentials_is_recorded() {
        let record = invoke(&session(), Endpoint::FetchBalance, ResolvedArgs::new(), false).await;

        assert!(!record.is_success());
        assert!(record.trace.is_none());
        match &record.outcome {
            Err(PlaygroundError::InvocationError { code, .. }) => {
                assert_eq!(*code, "AUTHENTICATION_ERROR")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_debug_mode_keeps_trace() {
        let record = invoke(&session(), Endpoint::FetchBalance, ResolvedArgs::new(), true).await;
        let trace = record.trace.unwrap();
        assert!(trace.contains("AuthenticationError"));
    }

    #[tokio::test]
    async fn test_bad_argument_is_invalid_parameter() {
        let args = ResolvedArgs::new()
            .with("symbol", json!("BTC/USD"))
            .with("type", json!("stop"))
            .with("side", json!("buy"))
            .with("amount", json!(1));
        let record = invoke(&session(), Endpoint::CreateOrder, args, false).await;
        assert!(matches!(
            record.outcome,
            Err(PlaygroundError::InvalidParameter { ref name, .. }) if name == "type"
        ));
    }
}
