//! Hashrate futures order book simulation.
//!
//! Walks through margin requirements, ladder aggregation around the latest
//! hashprice, and transient highlighting as new orders arrive.

use hashbook_core::logging::init_logging;
use hashbook_core::*;
use rust_decimal_macros::dec;

fn main() {
    let config = AppConfig::testnet();
    init_logging(&config.logging);

    println!("Hashrate Futures Order Book Simulation\n");

    scenario_1_margin();
    scenario_2_ladder(&config);
    if let Err(e) = scenario_3_highlighting(config) {
        eprintln!("highlight scenario failed: {e}");
        std::process::exit(1);
    }

    println!("\nAll simulations completed successfully.");
}

fn order(id: u32, price_units: i128, is_buy: bool, who: &str) -> Order {
    Order {
        id: OrderId(format!("0x{id:04x}")),
        price: TokenAmount::new(price_units),
        delivery_date: 1_700_000_000,
        is_buy,
        is_active: true,
        participant_address: ParticipantAddress::new(who),
    }
}

/// Required margin for long and short positions as the hashprice moves.
fn scenario_1_margin() {
    println!("Scenario 1: Margin Requirements\n");

    let entry = TokenAmount::new(5_000000);
    for market in [4_500000, 5_000000, 5_500000, 10_000000] {
        let market = TokenAmount::new(market);
        let long = margin_breakdown(entry, 2, market, 20, 7);
        let short = margin_breakdown(entry, -2, market, 20, 7);
        println!(
            "  market ${}: long needs ${} (pnl ${}), short needs ${} (pnl ${})",
            market.to_usdc(),
            long.required_margin.to_usdc(),
            long.pnl.to_usdc(),
            short.required_margin.to_usdc(),
            short.pnl.to_usdc(),
        );
    }
    println!();
}

/// Ladder around the latest index price with live orders overlaid.
fn scenario_2_ladder(config: &AppConfig) {
    println!("Scenario 2: Order Book Ladder\n");

    let orders = vec![
        order(1, 4_900000, true, "0xalice"),
        order(2, 4_950000, true, "0xbob"),
        order(3, 4_950000, true, "0xcarol"),
        order(4, 5_100000, false, "0xdave"),
    ];
    let points = vec![HashrateIndexPoint {
        updated_at: 1_700_000_000,
        price_token: TokenAmount::new(5_020000),
    }];

    let book = build_order_book(&orders, &points, config.book.tick_size, &config.book.ladder);
    println!("  {} rows, base price ${:?}", book.len(), book.base_price());
    println!("  best bid {:?}, best ask {:?}, spread {:?}", book.best_bid(), book.best_ask(), book.spread());

    let window = dec!(0.15);
    for row in book.rows().iter().rev() {
        let Some(base) = book.base_price() else { break };
        if (row.price - base).abs() > window {
            continue;
        }
        let marker = if row.is_last_hashprice { " <- last hashprice" } else { "" };
        println!(
            "  {:>6}  bids {:>2}  asks {:>2}{}",
            row.price,
            row.bid_units.map(|u| u.to_string()).unwrap_or_else(|| "-".into()),
            row.ask_units.map(|u| u.to_string()).unwrap_or_else(|| "-".into()),
            marker
        );
    }
    println!();
}

/// New orders flash their rows, then the highlight clears after the delay.
fn scenario_3_highlighting(config: AppConfig) -> Result<(), ViewError> {
    println!("Scenario 3: Change Highlighting\n");

    let mut view = OrderBookView::with_cache(ViewConfig::new(config), QueryCache::global())?;
    view.set_time(Timestamp::now());
    view.subscribe(|event| {
        if let EventPayload::HighlightsRaised(e) = &event.payload {
            println!("  [event {}] {} rows flashed, scroll to ${}", event.id.0, e.rows, e.scroll_to);
        }
    });

    let points = vec![HashrateIndexPoint {
        updated_at: 1_700_000_000,
        price_token: TokenAmount::new(5_000000),
    }];
    let mut orders = vec![order(1, 4_950000, true, "0xalice")];

    view.store_index_points(&points)?;
    view.store_orders(&orders)?;
    view.refresh()?;

    view.advance_time(1_000);
    orders.push(order(2, 5_050000, false, "0xbob"));
    view.store_orders(&orders)?;
    let result = view.refresh()?;
    println!("  after 1s: {} rows highlighted", result.highlighted);

    view.advance_time(3_000);
    println!(
        "  after 4s: ask row still flashing: {}",
        view.highlight_at(dec!(5.05)).is_some()
    );

    let me = ParticipantAddress::new("0xalice");
    view.store_positions(
        &me,
        &[Position {
            id: PositionId("0x01".into()),
            buyer: me.clone(),
            seller: ParticipantAddress::new("0xbob"),
            buy_price_per_day: TokenAmount::new(4_800000),
            sell_price_per_day: TokenAmount::new(4_800000),
            delivery_at: 1_700_086_400,
            start_time: 1_700_000_000,
            closed_at: None,
            buyer_pnl: None,
            seller_pnl: None,
        }],
    )?;
    if let Some(margin) = view.required_margin(&me)? {
        println!("  alice must hold ${} margin", margin.to_usdc());
    }

    let dropped = view.invalidate(POSITIONS_QUERY)?;
    println!("  positions invalidated after settlement ({dropped} cached)");

    view.teardown();
    println!("  view torn down, {} events recorded", view.events().len());
    Ok(())
}
