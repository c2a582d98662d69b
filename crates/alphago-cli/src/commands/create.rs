use alphago_core::models::Coords;
use alphago_core::util::normalize_text_option;
use alphago_core::{OrderDraft, OrderStatus};

use crate::cli::CreateArgs;
use crate::commands::common::{require_text, validate_price, Session};
use crate::error::CliError;

pub async fn run_create(args: CreateArgs, session: &Session) -> Result<(), CliError> {
    let draft = draft_from_args(args, session.profile.session())?;
    let local_id = session.engine.enqueue_create(draft).await?;
    println!("{local_id}");
    Ok(())
}

pub fn draft_from_args(
    args: CreateArgs,
    session_user: Option<String>,
) -> Result<OrderDraft, CliError> {
    let items = args
        .items
        .into_iter()
        .filter_map(|item| normalize_text_option(Some(item)))
        .collect::<Vec<_>>();

    Ok(OrderDraft {
        customer_name: require_text(&args.customer, "Customer name")?,
        customer_phone: require_text(&args.phone, "Customer phone")?,
        zone_code: require_text(&args.zone_code, "Zone code")?,
        zone_name: require_text(&args.zone_name, "Zone name")?,
        coords: Coords {
            lat: args.lat,
            lng: args.lng,
        },
        price_tnd: validate_price(args.price)?,
        items: (!items.is_empty()).then_some(items),
        note: normalize_text_option(args.note),
        status: OrderStatus::Pending,
        created_by: normalize_text_option(args.created_by)
            .or(session_user)
            .unwrap_or_else(|| "cli".to_string()),
    })
}
