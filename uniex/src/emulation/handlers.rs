use super::{Dispatch, EmulationContext, filter};
use crate::error::ExchangeError;
use serde_json::{Map, Value, json};

/// Route an emulated method to its handler, or pass through when none is implemented.
pub(super) async fn dispatch(method: &str, ctx: &EmulationContext<'_>) -> Dispatch {
    let result = match method {
        "fetch_ticker" => fetch_ticker(ctx).await,
        "fetch_bids_asks" => delegate(ctx, "fetch_bids_asks", "fetch_tickers").await,
        "fetch_currencies" => fetch_currencies(ctx).await,
        "fetch_trading_limits" => fetch_trading_limits(ctx).await,
        "fetch_transactions" => {
            delegate(ctx, "fetch_transactions", "fetch_deposits_withdrawals").await
        }
        "fetch_trading_fee" => select_for_symbol(ctx, "fetch_trading_fee", "fetch_trading_fees").await,
        "fetch_transaction_fee" => fetch_transaction_fee(ctx).await,
        "fetch_deposit_withdraw_fee" => fetch_deposit_withdraw_fee(ctx).await,
        "fetch_deposit_address" => fetch_deposit_address(ctx).await,
        "fetch_position" => select_for_symbol(ctx, "fetch_position", "fetch_positions").await,
        "fetch_position_history" => {
            delegate(ctx, "fetch_position_history", "fetch_positions_history").await
        }
        "fetch_leverage" => select_for_symbol(ctx, "fetch_leverage", "fetch_leverages").await,
        "fetch_margin_mode" => {
            select_for_symbol(ctx, "fetch_margin_mode", "fetch_margin_modes").await
        }
        "fetch_market_leverage_tiers" => {
            select_for_contract_symbol(ctx, "fetch_market_leverage_tiers", "fetch_leverage_tiers")
                .await
        }
        "fetch_funding_rate" => {
            select_for_contract_symbol(ctx, "fetch_funding_rate", "fetch_funding_rates").await
        }
        "fetch_funding_interval" => {
            select_for_contract_symbol(ctx, "fetch_funding_interval", "fetch_funding_intervals")
                .await
        }
        "fetch_isolated_borrow_rate" => fetch_isolated_borrow_rate(ctx).await,
        "fetch_open_orders" => fetch_orders_by_status(ctx, "fetch_open_orders", &["open"]).await,
        "fetch_closed_orders" => {
            fetch_orders_by_status(ctx, "fetch_closed_orders", &["closed"]).await
        }
        "fetch_canceled_orders" => {
            fetch_orders_by_status(ctx, "fetch_canceled_orders", &["canceled"]).await
        }
        "fetch_canceled_and_closed_orders" => fetch_canceled_and_closed_orders(ctx).await,
        "fetch_order" => fetch_order(ctx).await,
        "fetch_order_trades" => fetch_order_trades(ctx).await,
        "fetch_my_trades" => fetch_my_trades(ctx).await,
        "fetch_deposits_withdrawals" => fetch_deposits_withdrawals(ctx).await,
        _ => return Dispatch::Passthrough,
    };
    Dispatch::Handled(result)
}

/// Hand the call to another unified method untouched.
async fn delegate(
    ctx: &EmulationContext<'_>,
    emulated: &str,
    downstream: &str,
) -> Result<Value, ExchangeError> {
    ctx.call_required(emulated, downstream, ctx.params.clone())
        .await
}

/// Call a plural downstream method with `[symbol]` and select the symbol's entry.
async fn select_for_symbol(
    ctx: &EmulationContext<'_>,
    emulated: &str,
    downstream: &str,
) -> Result<Value, ExchangeError> {
    let symbol = ctx.require_param(emulated, "symbol")?.to_string();
    let mut params = ctx.params_without(&["symbol"]);
    params.insert("symbols".into(), json!([symbol]));

    let response = ctx.call_required(emulated, downstream, params).await?;
    select_by_symbol(&response, &symbol).ok_or_else(|| {
        ExchangeError::exchange_error(format!("{emulated}: no entry for {symbol}"))
    })
}

/// [`select_for_symbol`] for methods restricted to contract markets.
async fn select_for_contract_symbol(
    ctx: &EmulationContext<'_>,
    emulated: &str,
    downstream: &str,
) -> Result<Value, ExchangeError> {
    let symbol = ctx.require_param(emulated, "symbol")?.to_string();
    require_contract_market(ctx, emulated, &symbol).await?;
    select_for_symbol(ctx, emulated, downstream).await
}

async fn fetch_ticker(ctx: &EmulationContext<'_>) -> Result<Value, ExchangeError> {
    let symbol = ctx.require_param("fetch_ticker", "symbol")?.to_string();
    let mut params = ctx.params_without(&["symbol"]);
    params.insert("symbols".into(), json!([symbol]));

    let tickers = ctx
        .call_required("fetch_ticker", "fetch_tickers", params)
        .await?;
    select_by_symbol(&tickers, &symbol).ok_or_else(|| {
        ExchangeError::exchange_error(format!(
            "fetch_ticker: fetch_tickers returned no entry for {symbol}"
        ))
    })
}

/// Derive the currency table from market bases and quotes, keeping the highest
/// precision seen per code.
async fn fetch_currencies(ctx: &EmulationContext<'_>) -> Result<Value, ExchangeError> {
    const DEFAULT_PRECISION: f64 = 1e-8;

    let markets = ctx
        .call_required("fetch_currencies", "fetch_markets", Map::new())
        .await?;

    let mut currencies = Map::new();
    for market in as_list(&markets) {
        for side in ["base", "quote"] {
            let Some(code) = filter::field_string(&market, side) else {
                continue;
            };
            let precision = filter::get_field(&market, "precision")
                .and_then(|precision| precision.get("amount"))
                .and_then(Value::as_f64)
                .unwrap_or(DEFAULT_PRECISION);

            let better = currencies
                .get(&code)
                .and_then(|existing: &Value| existing.get("precision"))
                .and_then(Value::as_f64)
                .is_none_or(|existing| precision > existing);
            if better {
                currencies.insert(code.clone(), json!({"code": code, "precision": precision}));
            }
        }
    }

    Ok(Value::Object(currencies))
}

/// Per-symbol amount limits straight off the market table.
async fn fetch_trading_limits(ctx: &EmulationContext<'_>) -> Result<Value, ExchangeError> {
    let markets = ctx
        .call_required("fetch_trading_limits", "fetch_markets", Map::new())
        .await?;

    let wanted = ctx
        .params
        .get("symbols")
        .and_then(Value::as_array)
        .map(|symbols| {
            symbols
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect::<Vec<_>>()
        });

    let mut limits = Map::new();
    for market in as_list(&markets) {
        let Some(symbol) = filter::field_string(&market, "symbol") else {
            continue;
        };
        if wanted
            .as_ref()
            .is_some_and(|wanted| !wanted.contains(&symbol))
        {
            continue;
        }
        let amount = filter::get_field(&market, "limits")
            .and_then(|market_limits| market_limits.get("amount"))
            .cloned()
            .unwrap_or(Value::Null);
        limits.insert(symbol, json!({"limits": {"amount": amount}}));
    }

    Ok(Value::Object(limits))
}

async fn fetch_transaction_fee(ctx: &EmulationContext<'_>) -> Result<Value, ExchangeError> {
    let code = ctx.require_param("fetch_transaction_fee", "code")?.to_string();
    let mut params = ctx.params_without(&["code"]);
    params.insert("codes".into(), json!([code]));
    ctx.call_required("fetch_transaction_fee", "fetch_transaction_fees", params)
        .await
}

async fn fetch_deposit_withdraw_fee(ctx: &EmulationContext<'_>) -> Result<Value, ExchangeError> {
    let code = ctx
        .require_param("fetch_deposit_withdraw_fee", "code")?
        .to_string();
    let mut params = ctx.params_without(&["code"]);
    params.insert("codes".into(), json!([code]));

    let fees = ctx
        .call_required(
            "fetch_deposit_withdraw_fee",
            "fetch_deposit_withdraw_fees",
            params,
        )
        .await?;
    select_by_key(&fees, "code", &code).ok_or_else(|| {
        ExchangeError::exchange_error(format!("fetch_deposit_withdraw_fee: no entry for {code}"))
    })
}

/// Deposit address lookup with the fixed strategy order: plural by code, then
/// by-network, then unsupported.
async fn fetch_deposit_address(ctx: &EmulationContext<'_>) -> Result<Value, ExchangeError> {
    let code = ctx.require_param("fetch_deposit_address", "code")?.to_string();

    if ctx.available("fetch_deposit_addresses") {
        let mut params = ctx.params_without(&["code"]);
        params.insert("codes".into(), json!([code]));
        let addresses = ctx.call("fetch_deposit_addresses", params).await?;
        return select_by_key(&addresses, "code", &code).ok_or_else(|| {
            ExchangeError::exchange_error(format!("fetch_deposit_address: no entry for {code}"))
        });
    }

    if ctx.available("fetch_deposit_addresses_by_network") {
        let network = ctx.param_str("network").map(str::to_string);
        let mut params = ctx.params_without(&["network"]);
        params.insert("code".into(), Value::String(code.clone()));
        let by_network = ctx.call("fetch_deposit_addresses_by_network", params).await?;
        return select_by_network(&by_network, network.as_deref()).ok_or_else(|| {
            ExchangeError::exchange_error(format!("fetch_deposit_address: no address for {code}"))
        });
    }

    Err(ExchangeError::not_supported("fetch_deposit_address"))
}

async fn fetch_isolated_borrow_rate(ctx: &EmulationContext<'_>) -> Result<Value, ExchangeError> {
    let symbol = ctx
        .require_param("fetch_isolated_borrow_rate", "symbol")?
        .to_string();
    let rates = ctx
        .call_required(
            "fetch_isolated_borrow_rate",
            "fetch_isolated_borrow_rates",
            ctx.params_without(&["symbol"]),
        )
        .await?;
    select_by_symbol(&rates, &symbol).ok_or_else(|| {
        ExchangeError::exchange_error(format!("fetch_isolated_borrow_rate: no entry for {symbol}"))
    })
}

/// `fetch_orders` filtered down to one normalised status set.
async fn fetch_orders_by_status(
    ctx: &EmulationContext<'_>,
    emulated: &str,
    statuses: &[&str],
) -> Result<Value, ExchangeError> {
    let orders = ctx
        .call_required(emulated, "fetch_orders", ctx.params.clone())
        .await?;
    let filtered = as_list(&orders)
        .into_iter()
        .filter(|order| {
            filter::normalized_status(order)
                .is_some_and(|status| statuses.contains(&status.as_str()))
        })
        .collect();
    Ok(Value::Array(filtered))
}

async fn fetch_canceled_and_closed_orders(
    ctx: &EmulationContext<'_>,
) -> Result<Value, ExchangeError> {
    let orders = ctx
        .call_required(
            "fetch_canceled_and_closed_orders",
            "fetch_orders",
            ctx.params_without(&["since", "limit"]),
        )
        .await?;

    let mut merged = as_list(&orders)
        .into_iter()
        .filter(|order| {
            filter::normalized_status(order)
                .is_some_and(|status| status == "canceled" || status == "closed")
        })
        .collect::<Vec<_>>();
    filter::sort_by_timestamp_desc(&mut merged, "timestamp");

    Ok(Value::Array(filter::filter_by_since_limit(
        merged,
        ctx.param_i64("since"),
        ctx.param_usize("limit"),
        "timestamp",
    )))
}

/// Find one order by id, trying endpoints in the fixed priority order.
async fn fetch_order(ctx: &EmulationContext<'_>) -> Result<Value, ExchangeError> {
    let id = ctx.require_param("fetch_order", "id")?.to_string();
    let params = ctx.params_without(&["id"]);

    let orders = if ctx.available("fetch_orders") {
        as_list(&ctx.call("fetch_orders", params).await?)
    } else if ctx.available("fetch_open_orders")
        && ctx.available("fetch_closed_orders")
        && ctx.available("fetch_canceled_orders")
    {
        let mut orders = Vec::new();
        for method in ["fetch_open_orders", "fetch_closed_orders", "fetch_canceled_orders"] {
            orders.extend(as_list(&ctx.call(method, params.clone()).await?));
        }
        orders
    } else {
        return Err(ExchangeError::not_supported("fetch_order"));
    };

    orders
        .into_iter()
        .find(|order| filter::field_string(order, "id").as_deref() == Some(id.as_str()))
        .ok_or_else(|| ExchangeError::order_not_found(format!("order {id} not found")))
}

/// Trades of one order: filter caller-provided trades, else filter own trade history.
async fn fetch_order_trades(ctx: &EmulationContext<'_>) -> Result<Value, ExchangeError> {
    let id = ctx.require_param("fetch_order_trades", "id")?.to_string();

    let trades = match ctx.params.get("trades").and_then(Value::as_array) {
        Some(trades) => trades.clone(),
        None => {
            let params = ctx.params_without(&["id", "trades"]);
            as_list(
                &ctx.call_required("fetch_order_trades", "fetch_my_trades", params)
                    .await?,
            )
        }
    };

    let filtered = trades
        .into_iter()
        .filter(|trade| {
            filter::field_string(trade, "order").as_deref() == Some(id.as_str())
                || filter::field_string(trade, "order_id").as_deref() == Some(id.as_str())
        })
        .collect();
    Ok(Value::Array(filtered))
}

/// Flatten per-order trade lists out of `fetch_orders`.
async fn fetch_my_trades(ctx: &EmulationContext<'_>) -> Result<Value, ExchangeError> {
    let symbol = ctx.param_str("symbol").map(str::to_string);
    let orders = ctx
        .call_required(
            "fetch_my_trades",
            "fetch_orders",
            ctx.params_without(&["since", "limit"]),
        )
        .await?;

    let mut trades = Vec::new();
    for order in as_list(&orders) {
        let Some(order_trades) = filter::get_field(&order, "trades").and_then(Value::as_array)
        else {
            continue;
        };
        trades.extend(order_trades.iter().cloned());
    }

    if let Some(symbol) = symbol {
        trades.retain(|trade| {
            filter::field_string(trade, "symbol").as_deref() == Some(symbol.as_str())
        });
    }

    Ok(Value::Array(filter::filter_by_since_limit(
        trades,
        ctx.param_i64("since"),
        ctx.param_usize("limit"),
        "timestamp",
    )))
}

/// Deposits and withdrawals with the fixed strategy order: dedicated endpoints (an
/// unimplemented one contributes nothing), then a filtered ledger, then unsupported.
async fn fetch_deposits_withdrawals(ctx: &EmulationContext<'_>) -> Result<Value, ExchangeError> {
    let has_deposits = ctx.available("fetch_deposits");
    let has_withdrawals = ctx.available("fetch_withdrawals");

    if has_deposits || has_withdrawals {
        let mut entries = Vec::new();
        if has_deposits {
            entries.extend(as_list(&ctx.call("fetch_deposits", ctx.params.clone()).await?));
        }
        if has_withdrawals {
            entries.extend(as_list(
                &ctx.call("fetch_withdrawals", ctx.params.clone()).await?,
            ));
        }
        filter::sort_by_timestamp_desc(&mut entries, "timestamp");
        return Ok(Value::Array(filter::filter_by_since_limit(
            entries,
            ctx.param_i64("since"),
            ctx.param_usize("limit"),
            "timestamp",
        )));
    }

    if ctx.available("fetch_ledger") {
        let ledger = ctx.call("fetch_ledger", ctx.params.clone()).await?;
        let entries = as_list(&ledger)
            .into_iter()
            .filter(|entry| {
                filter::field_string(entry, "type")
                    .map(|kind| kind.to_lowercase())
                    .is_some_and(|kind| kind == "deposit" || kind == "withdrawal")
            })
            .collect();
        return Ok(Value::Array(filter::filter_by_since_limit(
            entries,
            ctx.param_i64("since"),
            ctx.param_usize("limit"),
            "timestamp",
        )));
    }

    Err(ExchangeError::not_supported("fetch_deposits_withdrawals"))
}

/// Require the symbol's market to be a contract market.
async fn require_contract_market(
    ctx: &EmulationContext<'_>,
    emulated: &str,
    symbol: &str,
) -> Result<(), ExchangeError> {
    let markets = ctx
        .call_required(emulated, "fetch_markets", Map::new())
        .await?;
    let market = select_by_symbol(&markets, symbol).ok_or_else(|| {
        ExchangeError::exchange_error(format!("{emulated}: unknown market {symbol}"))
    })?;

    let contract = filter::get_field(&market, "contract")
        .map(truthy)
        .unwrap_or(false);
    if contract {
        Ok(())
    } else {
        Err(ExchangeError::invalid_parameters(format!(
            "{emulated} supports contract markets only"
        )))
    }
}

/// Entry list out of a plural response: arrays as-is, symbol-keyed maps by value.
fn as_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::Object(map) => map.values().cloned().collect(),
        _ => Vec::new(),
    }
}

/// Select a symbol's entry out of either a keyed map or a list with `symbol` fields.
fn select_by_symbol(response: &Value, symbol: &str) -> Option<Value> {
    select_by_key(response, "symbol", symbol)
}

fn select_by_key(response: &Value, key: &str, wanted: &str) -> Option<Value> {
    match response {
        Value::Object(map) => map.get(wanted).cloned(),
        Value::Array(items) => items
            .iter()
            .find(|entry| filter::field_string(entry, key).as_deref() == Some(wanted))
            .cloned(),
        _ => None,
    }
}

/// Select an address entry by network name (case-insensitive), or take the first.
fn select_by_network(response: &Value, network: Option<&str>) -> Option<Value> {
    match response {
        Value::Object(map) => match network {
            Some(network) => map
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(network))
                .map(|(_, value)| value.clone()),
            None => map.values().next().cloned(),
        },
        Value::Array(items) => match network {
            Some(network) => items
                .iter()
                .find(|entry| {
                    filter::field_string(entry, "network")
                        .is_some_and(|entry_network| entry_network.eq_ignore_ascii_case(network))
                })
                .cloned(),
            None => items.first().cloned(),
        },
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty() && s != "false" && s != "0",
        Value::Null => false,
        _ => true,
    }
}
