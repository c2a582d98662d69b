use crate::commands::common::{format_order_lines, order_to_list_item, OrderListItem, Session};
use crate::error::CliError;

pub async fn run_list(limit: usize, as_json: bool, session: &Session) -> Result<(), CliError> {
    let mut orders = session.engine.cached_orders().await;
    orders.truncate(limit);

    if as_json {
        let json_items = orders
            .iter()
            .map(order_to_list_item)
            .collect::<Vec<OrderListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
        return Ok(());
    }

    if orders.is_empty() {
        println!("No cached orders. Run `alphago refresh` while online.");
        return Ok(());
    }

    for line in format_order_lines(&orders) {
        println!("{line}");
    }
    Ok(())
}
