use alphago_core::util::normalize_text_option;
use alphago_core::OrderChanges;

use crate::cli::UpdateArgs;
use crate::commands::common::{normalize_order_identifier, require_text, validate_price, Session};
use crate::error::CliError;

pub async fn run_update(args: UpdateArgs, session: &Session) -> Result<(), CliError> {
    let id = normalize_order_identifier(&args.id)?;
    let changes = changes_from_args(args)?;
    session.engine.enqueue_update(&id, changes).await?;
    println!("{id}");
    Ok(())
}

pub fn changes_from_args(args: UpdateArgs) -> Result<OrderChanges, CliError> {
    let changes = OrderChanges {
        customer_name: args
            .customer
            .map(|value| require_text(&value, "Customer name"))
            .transpose()?,
        customer_phone: args
            .phone
            .map(|value| require_text(&value, "Customer phone"))
            .transpose()?,
        zone_code: args
            .zone_code
            .map(|value| require_text(&value, "Zone code"))
            .transpose()?,
        zone_name: args
            .zone_name
            .map(|value| require_text(&value, "Zone name"))
            .transpose()?,
        price_tnd: args.price.map(validate_price).transpose()?,
        status: args.status,
        note: normalize_text_option(args.note),
        ..OrderChanges::default()
    };

    if changes.is_empty() {
        return Err(CliError::NoChanges);
    }
    Ok(changes)
}
