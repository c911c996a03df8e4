use tabled::Tabled;

use crate::api::ShopApi;
use crate::cache::Cache;
use crate::cli::ReviewArgs;
use crate::error::{Result, ShopError};
use crate::output::{self, format_date_only, stars, truncate};
use crate::store::Store;
use crate::types::Review;

#[derive(Tabled)]
struct ReviewRow {
    #[tabled(rename = "Rating")]
    rating: String,
    #[tabled(rename = "By")]
    name: String,
    #[tabled(rename = "Date")]
    date: String,
    #[tabled(rename = "Comment")]
    comment: String,
}

impl From<&Review> for ReviewRow {
    fn from(review: &Review) -> Self {
        Self {
            rating: stars(f32::from(review.rating)),
            name: review.name.clone(),
            date: format_date_only(&review.created_at),
            comment: truncate(&review.comment, 60),
        }
    }
}

pub async fn list<A: ShopApi>(api: &A, product_id: &str) -> Result<()> {
    let reviews = api.reviews(product_id).await?;

    if reviews.is_empty() && !output::is_json_output() {
        output::print_message("No reviews yet.");
        return Ok(());
    }

    output::print_table(&reviews, |r| ReviewRow::from(r), |r| {
        format!("{}/5  {}  {}", r.rating, r.name, r.comment)
    });

    Ok(())
}

fn validate_rating(rating: u8) -> Result<u8> {
    if (1..=5).contains(&rating) {
        Ok(rating)
    } else {
        Err(ShopError::InvalidRating(rating))
    }
}

pub async fn add<A: ShopApi>(api: &A, store: &Store, cache: &mut Cache, args: ReviewArgs) -> Result<()> {
    store.auth.require_user()?;
    let rating = validate_rating(args.rating)?;

    api.add_review(&args.product_id, rating, args.comment.trim()).await?;
    // Rating and review count changed on the server.
    cache.invalidate(&args.product_id);

    output::print_message(&format!("Review added to {}", args.product_id));
    Ok(())
}
