//! Customer management commands.

use chrono::{DateTime, Utc};
use visitmark_server::models::Customer;
use visitmark_server::services::LoyaltyService;

use super::{CliError, connect};

/// Print all customers, most recently updated first.
pub async fn list() -> Result<(), CliError> {
    let (config, pool) = connect().await?;
    let customers = LoyaltyService::new(&pool, &config.loyalty)
        .list_customers()
        .await?;

    #[allow(clippy::print_stdout)]
    {
        println!(
            "{:<36}  {:<20}  {:>6}  {:>6}  {:<20}",
            "ID", "NAME", "VISITS", "SINCE", "LAST VISIT"
        );
        for customer in &customers {
            println!("{}", format_row(customer));
        }
        println!("{} customer(s)", customers.len());
    }

    Ok(())
}

/// Delete a customer by ID.
pub async fn delete(id: &str) -> Result<(), CliError> {
    let (config, pool) = connect().await?;
    let id = LoyaltyService::new(&pool, &config.loyalty)
        .delete_customer(id)
        .await?;

    tracing::info!("Deleted customer {id}");
    Ok(())
}

fn format_row(customer: &Customer) -> String {
    format!(
        "{:<36}  {:<20}  {:>6}  {:>6}  {:<20}",
        customer.id,
        customer.display_name.as_deref().unwrap_or("-"),
        customer.counters.visits_total,
        customer.counters.visits_since_reward,
        customer
            .last_visit_at
            .as_ref()
            .map_or_else(|| "never".to_string(), format_timestamp),
    )
}

fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use visitmark_core::{CustomerId, VisitCounters};

    use super::*;

    fn customer(display_name: Option<&str>, last_visit_at: Option<DateTime<Utc>>) -> Customer {
        let created = Utc.with_ymd_and_hms(2026, 10, 1, 9, 0, 0).unwrap();
        Customer {
            id: CustomerId::generate(),
            display_name: display_name.map(String::from),
            counters: VisitCounters {
                visits_total: 7,
                visits_since_reward: 2,
            },
            last_visit_at,
            created_at: created,
            updated_at: last_visit_at.unwrap_or(created),
        }
    }

    #[test]
    fn test_format_row_with_visit() {
        let at = Utc.with_ymd_and_hms(2026, 10, 18, 8, 30, 5).unwrap();
        let c = customer(Some("Ada"), Some(at));
        let row = format_row(&c);
        assert!(row.starts_with(&c.id.to_string()));
        assert!(row.contains("Ada"));
        assert!(row.contains("2026-10-18 08:30:05"));
    }

    #[test]
    fn test_format_row_never_visited() {
        let row = format_row(&customer(None, None));
        assert!(row.contains("never"));
        assert!(row.contains(" - "));
    }
}
