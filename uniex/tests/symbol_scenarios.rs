//! Spec-driven symbol conversion against the compiled exchange specs.

use uniex::{MarketType, symbol};
use uniex::exchange::{Binance, Bybit, Deribit, Gateio, Kraken, KrakenFutures, Okx};

#[test]
fn test_kraken_padded_pair_normalises_with_alias() {
    assert_eq!(symbol::normalize("XXBTZUSD", Kraken::spec()), "BTC/USD");
    assert_eq!(symbol::denormalize("BTC/USD", Kraken::spec()), "XXBTZUSD");
}

#[test]
fn test_deribit_option_conversion() {
    let id = symbol::to_exchange_id("BTC/USD:BTC-260112-84000-C", Deribit::spec(), None).unwrap();
    assert_eq!(id, "BTC-12JAN26-84000-C");
    assert_eq!(
        symbol::from_exchange_id(&id, Deribit::spec(), MarketType::Option).unwrap(),
        "BTC/USD:BTC-260112-84000-C"
    );
}

#[test]
fn test_deribit_perpetual_drops_usd_quote() {
    let id = symbol::to_exchange_id("BTC/USD:BTC", Deribit::spec(), None).unwrap();
    assert_eq!(id, "BTC-PERPETUAL");
    assert_eq!(
        symbol::from_exchange_id(&id, Deribit::spec(), MarketType::Swap).unwrap(),
        "BTC/USD:BTC"
    );
}

#[test]
fn test_binance_future_conversion() {
    let id = symbol::to_exchange_id("BTC/USDT:USDT-260327", Binance::spec(), None).unwrap();
    assert_eq!(id, "BTCUSDT_260327");
    assert_eq!(
        symbol::from_exchange_id(&id, Binance::spec(), MarketType::Future).unwrap(),
        "BTC/USDT:USDT-260327"
    );
}

#[test]
fn test_bybit_future_keeps_quote_component() {
    let id = symbol::to_exchange_id("BTC/USDT:USDT-260327", Bybit::spec(), None).unwrap();
    assert_eq!(id, "BTC-USDT-27MAR26");
    assert_eq!(
        symbol::from_exchange_id(&id, Bybit::spec(), MarketType::Future).unwrap(),
        "BTC/USDT:USDT-260327"
    );
}

#[test]
fn test_okx_swap_and_option_conversion() {
    let swap = symbol::to_exchange_id("BTC/USDT:USDT", Okx::spec(), None).unwrap();
    assert_eq!(swap, "BTC-USDT-SWAP");
    assert_eq!(
        symbol::from_exchange_id(&swap, Okx::spec(), MarketType::Swap).unwrap(),
        "BTC/USDT:USDT"
    );

    let option = symbol::to_exchange_id("BTC/USD:BTC-260112-84000-C", Okx::spec(), None).unwrap();
    assert_eq!(option, "BTC-USD-260112-84000-C");
    assert_eq!(
        symbol::from_exchange_id(&option, Okx::spec(), MarketType::Option).unwrap(),
        "BTC/USD:BTC-260112-84000-C"
    );
}

#[test]
fn test_gateio_century_padding_round_trip() {
    let id = symbol::to_exchange_id("BTC/USDT:USDT-260327", Gateio::spec(), None).unwrap();
    assert_eq!(id, "BTCUSDT_20260327");
    assert_eq!(
        symbol::from_exchange_id(&id, Gateio::spec(), MarketType::Future).unwrap(),
        "BTC/USDT:USDT-260327"
    );
}

#[test]
fn test_kraken_futures_contract_prefix() {
    let id = symbol::to_exchange_id("BTC/USD:BTC", KrakenFutures::spec(), None).unwrap();
    assert_eq!(id, "PI_XBTUSD");
    assert_eq!(
        symbol::from_exchange_id(&id, KrakenFutures::spec(), MarketType::Swap).unwrap(),
        "BTC/USD:BTC"
    );
}

#[test]
fn test_round_trip_across_compiled_specs() {
    let cases = [
        ("BTC/USDT", MarketType::Spot),
        ("ETH/USDT:USDT", MarketType::Swap),
        ("BTC/USDT:USDT-260327", MarketType::Future),
    ];

    for spec in [Binance::spec(), Bybit::spec()] {
        for (unified, market) in cases {
            let id = symbol::to_exchange_id(unified, spec, Some(market)).unwrap();
            let back = symbol::from_exchange_id(&id, spec, market).unwrap();
            assert_eq!(back, unified, "{} failed round trip via {id}", spec.id);
        }
    }
}

#[test]
fn test_validation_reports_missing_pattern() {
    let error =
        symbol::validate_symbol_conversion("BTC/USD:BTC-260112-84000-C", Binance::spec(), None)
            .unwrap_err();
    assert!(error.message.contains("option"));

    assert!(symbol::validate_symbol_conversion("BTC/USDT", Binance::spec(), None).is_ok());
    assert!(symbol::validate_symbol_conversion("not-a-symbol", Binance::spec(), None).is_err());
}
