//! Stop controller integration tests against the paper broker

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use trade_sentinel::broker::{Broker, OrderSide, PaperBroker, Position, PositionSide};
use trade_sentinel::stops::{ExitReason, StopController, StopKind};

fn long_position(symbol: &str, quantity: Decimal, entry: Decimal) -> Position {
    Position {
        symbol: symbol.to_string(),
        quantity,
        entry_price: entry,
        current_price: entry,
        unrealized_pnl: dec!(0),
        side: PositionSide::Long,
    }
}

#[tokio::test]
async fn test_complete_stop_loss_workflow() {
    let broker = Arc::new(PaperBroker::new());
    broker
        .set_position(long_position("AAPL", dec!(10), dec!(150)))
        .await;

    let mut controller = StopController::new(broker.clone(), Duration::from_millis(10));
    let mut events = controller.events();

    // Percentage stop plus percentage take-profit on the same symbol
    controller
        .set_stop(
            "AAPL",
            StopKind::Percentage,
            None,
            Some(dec!(0.02)),
            None,
            Some(dec!(150)),
        )
        .await;
    controller
        .set_take_profit("AAPL", None, Some(dec!(0.05)))
        .await;

    let config = controller.get_stop("AAPL").await.unwrap();
    assert_eq!(config.stop_percentage, Some(dec!(0.02)));
    assert_eq!(config.take_profit_percentage, Some(dec!(0.05)));

    // Price holds above the 147 stop: nothing fires
    broker.set_price("AAPL", dec!(148)).await;
    controller.poll_once().await.unwrap();
    assert!(broker.orders().await.is_empty());

    // Price breaches the stop: full-quantity market exit
    broker.set_price("AAPL", dec!(146)).await;
    controller.poll_once().await.unwrap();

    let orders = broker.orders().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].symbol, "AAPL");
    assert_eq!(orders[0].quantity, dec!(10));
    assert_eq!(orders[0].side, OrderSide::Sell);

    let event = events.recv().await.unwrap();
    assert_eq!(event.reason, ExitReason::StopLoss);
    assert_eq!(event.quantity, dec!(10));

    // Config is gone and the broker no longer reports the position
    assert!(controller.get_stop("AAPL").await.is_none());
    assert!(broker.get_position("AAPL").await.unwrap().is_none());
}

#[tokio::test]
async fn test_trailing_stop_protects_profit() {
    let broker = Arc::new(PaperBroker::new());
    broker
        .set_position(long_position("AAPL", dec!(10), dec!(150)))
        .await;

    let controller = StopController::new(broker.clone(), Duration::from_millis(10));
    controller
        .set_stop(
            "AAPL",
            StopKind::Trailing,
            None,
            None,
            Some(dec!(0.03)),
            Some(dec!(150)),
        )
        .await;

    // Rally to 160: stop ratchets to 155.2
    broker.set_price("AAPL", dec!(160)).await;
    controller.poll_once().await.unwrap();
    let config = controller.get_stop("AAPL").await.unwrap();
    assert_eq!(config.stop_price, Some(dec!(155.20)));

    // Rally to 165: stop follows to 160.05
    broker.set_price("AAPL", dec!(165)).await;
    controller.poll_once().await.unwrap();
    let config = controller.get_stop("AAPL").await.unwrap();
    assert_eq!(config.stop_price, Some(dec!(160.05)));

    // Pullback to 162: stop stays put, no exit
    broker.set_price("AAPL", dec!(162)).await;
    controller.poll_once().await.unwrap();
    let config = controller.get_stop("AAPL").await.unwrap();
    assert_eq!(config.stop_price, Some(dec!(160.05)));
    assert!(broker.orders().await.is_empty());

    // Fall through the ratcheted stop: locked-in profit is taken
    broker.set_price("AAPL", dec!(160)).await;
    controller.poll_once().await.unwrap();
    assert_eq!(broker.orders().await.len(), 1);
    assert!(controller.get_stop("AAPL").await.is_none());
}

#[tokio::test]
async fn test_short_position_mirrored_triggers() {
    let broker = Arc::new(PaperBroker::new());
    broker
        .set_position(Position {
            symbol: "TSLA".to_string(),
            quantity: dec!(5),
            entry_price: dec!(200),
            current_price: dec!(200),
            unrealized_pnl: dec!(0),
            side: PositionSide::Short,
        })
        .await;

    let controller = StopController::new(broker.clone(), Duration::from_millis(10));
    controller
        .set_stop(
            "TSLA",
            StopKind::Percentage,
            None,
            Some(dec!(0.02)),
            None,
            Some(dec!(200)),
        )
        .await;

    // Short stop sits above entry at 204; a drop is favorable
    broker.set_price("TSLA", dec!(196)).await;
    controller.poll_once().await.unwrap();
    assert!(broker.orders().await.is_empty());

    // Price rallies through the stop: exit is a buy
    broker.set_price("TSLA", dec!(205)).await;
    controller.poll_once().await.unwrap();

    let orders = broker.orders().await;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].side, OrderSide::Buy);
}

#[tokio::test]
async fn test_background_loop_fires_and_cancels_cleanly() {
    let broker = Arc::new(PaperBroker::new());
    broker
        .set_position(long_position("AAPL", dec!(10), dec!(150)))
        .await;

    let mut controller = StopController::new(broker.clone(), Duration::from_millis(10));
    let mut events = controller.events();
    controller
        .set_stop(
            "AAPL",
            StopKind::Fixed,
            Some(dec!(145)),
            None,
            None,
            Some(dec!(150)),
        )
        .await;

    controller.start();
    broker.set_price("AAPL", dec!(140)).await;

    let event = tokio::time::timeout(Duration::from_secs(2), events.recv())
        .await
        .expect("exit should fire within the timeout")
        .unwrap();
    assert_eq!(event.reason, ExitReason::StopLoss);

    controller.stop().await;

    // The loop is gone; further price moves change nothing
    broker
        .set_position(long_position("MSFT", dec!(5), dec!(300)))
        .await;
    controller
        .set_stop("MSFT", StopKind::Fixed, Some(dec!(310)), None, None, None)
        .await;
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(broker.orders().await.len(), 1);
}

#[tokio::test]
async fn test_gate_and_controller_wired_around_a_broker() {
    use trade_sentinel::risk::{Admission, RiskGate, RiskLimits};

    let broker = Arc::new(PaperBroker::new());
    let gate = RiskGate::new(RiskLimits {
        max_position_value: dec!(10000),
        max_daily_loss: dec!(1000),
        max_open_positions: 5,
        risk_fraction_per_trade: dec!(0.02),
    })
    .unwrap();

    // Admission and sizing against the live account snapshot
    let account = broker.get_account().await.unwrap();
    let open_count = broker.get_positions().await.unwrap().len();
    assert_eq!(gate.can_open_position(open_count, &account), Admission::Allowed);

    let quantity = gate.calculate_position_size(&account, dec!(150), Some(dec!(145)));
    assert_eq!(quantity, 66); // clamped by max_position_value

    // Entry order, then arm a stop for the new position
    broker
        .place_order(
            "AAPL",
            Decimal::from(quantity),
            OrderSide::Buy,
            trade_sentinel::broker::OrderType::Market,
            None,
        )
        .await
        .unwrap();
    broker
        .set_position(long_position("AAPL", Decimal::from(quantity), dec!(150)))
        .await;

    let controller = StopController::new(broker.clone(), Duration::from_millis(10));
    controller
        .set_stop(
            "AAPL",
            StopKind::Percentage,
            None,
            Some(dec!(0.02)),
            None,
            Some(dec!(150)),
        )
        .await;

    // Stop breach closes the full sized quantity
    broker.set_price("AAPL", dec!(146)).await;
    controller.poll_once().await.unwrap();

    let orders = broker.orders().await;
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[1].side, OrderSide::Sell);
    assert_eq!(orders[1].quantity, Decimal::from(quantity));
}

#[tokio::test]
async fn test_exit_retry_after_broker_recovers() {
    let broker = Arc::new(PaperBroker::new());
    broker
        .set_position(long_position("AAPL", dec!(10), dec!(150)))
        .await;

    let controller = StopController::new(broker.clone(), Duration::from_millis(10));
    controller
        .set_stop(
            "AAPL",
            StopKind::Fixed,
            Some(dec!(145)),
            None,
            None,
            Some(dec!(150)),
        )
        .await;

    broker.fail_orders(true).await;
    broker.set_price("AAPL", dec!(144)).await;
    controller.poll_once().await.unwrap();

    // Submission failed: the config survives for the next tick
    assert!(controller.get_stop("AAPL").await.is_some());
    assert!(broker.orders().await.is_empty());

    broker.fail_orders(false).await;
    controller.poll_once().await.unwrap();
    assert_eq!(broker.orders().await.len(), 1);
    assert!(controller.get_stop("AAPL").await.is_none());
}
