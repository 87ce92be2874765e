#![cfg(target_arch = "wasm32")]

use market_playback_engine::{js_excess_return_chart, MarketSimulation};
use serde::Serialize;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

#[wasm_bindgen_test]
fn start_tick_until_null() {
    let mut sim = MarketSimulation::js_with_seed(1);
    let first = sim.js_start(JsValue::UNDEFINED).unwrap();
    assert!(first.is_object());
    assert!(sim.js_is_running());
    assert_eq!(sim.js_interval_ms(), 100.0);

    let mut published = 1;
    while !sim.js_tick().unwrap().is_null() {
        published += 1;
    }
    assert_eq!(published, 300);
    assert!(!sim.js_is_running());
}

#[wasm_bindgen_test]
fn trades_return_null_when_refused() {
    let mut sim = MarketSimulation::js_with_seed(2);
    sim.js_start(JsValue::NULL).unwrap();
    assert!(sim.js_buy().unwrap().is_null());
    assert!(sim.js_sell().unwrap().is_object());
    assert!(sim.js_sell().unwrap().is_null());
}

#[wasm_bindgen_test]
fn malformed_history_is_an_error() {
    let mut sim = MarketSimulation::js_with_seed(3);
    assert!(sim.js_load_historical("not json").is_err());
    let ok = sim.js_load_historical(r#"[{"Date":"2001-01-02","Close":1283.27}]"#);
    assert_eq!(ok.unwrap(), 1);
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StoredRun {
    total_trades: u32,
    #[serde(rename = "portfolioCAGR")]
    portfolio_cagr: f64,
    #[serde(rename = "buyHoldCAGR")]
    buy_hold_cagr: f64,
}

#[wasm_bindgen_test]
fn chart_accepts_stored_run_documents() {
    let runs = vec![
        StoredRun { total_trades: 4, portfolio_cagr: 9.0, buy_hold_cagr: 7.5 },
        StoredRun { total_trades: 8, portfolio_cagr: 5.0, buy_hold_cagr: 7.5 },
    ];
    let chart = js_excess_return_chart(serde_wasm_bindgen::to_value(&runs).unwrap()).unwrap();
    assert!(chart.is_object());
}

#[wasm_bindgen_test]
fn chart_rejects_malformed_records() {
    assert!(js_excess_return_chart(JsValue::from_str("not a list")).is_err());
}
