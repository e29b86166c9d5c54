/// Review ledger tests - full command flow over the in-memory store
///
/// Tests cover:
/// - Star buckets and average across add/remove
/// - Duplicate review and duplicate reaction rejection
/// - Concurrent writers on one product
/// - Reaction queries and the rating leaderboard
/// - Rebuilding drifted aggregates
mod utils;

use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;
use storefront_lib::modules::reviews::domain::services::invariants;
use storefront_lib::modules::reviews::{
    AddReviewCommand, Polarity, ProductStore, ReactCommand, RemoveReviewCommand, ReviewAggregate,
    UserReaction,
};
use storefront_lib::shared::errors::AppError;
use tokio_test::{assert_err, assert_ok};
use utils::factories::{memory_ledger, ReviewFactory};
use uuid::Uuid;

fn buckets(aggregate: &ReviewAggregate) -> Vec<(u8, u32)> {
    aggregate
        .star_counts()
        .iter()
        .map(|(rating, count)| (rating.value(), count))
        .collect()
}

#[tokio::test]
async fn add_and_remove_keep_statistics_in_step() {
    let (_store, ledger) = memory_ledger();
    let product = Uuid::new_v4();
    assert_ok!(ledger.register_product(product).await);

    let first = ledger
        .add_review(ReviewFactory::for_product(product).rating(4).build())
        .await
        .unwrap();
    let second = ledger
        .add_review(ReviewFactory::for_product(product).rating(2).build())
        .await
        .unwrap();

    let aggregate = ledger.aggregate(product).await.unwrap();
    assert_eq!(buckets(&aggregate), vec![(2, 1), (4, 1)]);
    assert_eq!(aggregate.average_rating(), 3.0);

    ledger
        .remove_review(RemoveReviewCommand::new(product, first.id()))
        .await
        .unwrap();
    let aggregate = ledger.aggregate(product).await.unwrap();
    assert_eq!(buckets(&aggregate), vec![(2, 1)]);
    assert_eq!(aggregate.average_rating(), 2.0);

    ledger
        .remove_review(RemoveReviewCommand::new(product, second.id()))
        .await
        .unwrap();
    let aggregate = ledger.aggregate(product).await.unwrap();
    assert!(buckets(&aggregate).is_empty());
    assert_eq!(aggregate.average_rating(), 0.0);
    assert!(aggregate.is_empty());
}

#[tokio::test]
async fn removing_the_only_review_yields_zero_average() {
    let (_store, ledger) = memory_ledger();
    let product = Uuid::new_v4();
    ledger.register_product(product).await.unwrap();

    let review = ledger
        .add_review(ReviewFactory::for_product(product).rating(5).build())
        .await
        .unwrap();
    let removed = ledger
        .remove_review(RemoveReviewCommand::new(product, review.id()))
        .await
        .unwrap();
    assert_eq!(removed.id(), review.id());

    let aggregate = ledger.aggregate(product).await.unwrap();
    assert_eq!(aggregate.average_rating(), 0.0);
    assert!(!aggregate.average_rating().is_nan());
    assert_eq!(aggregate.star_counts().total(), 0);
}

#[tokio::test]
async fn second_review_by_same_author_is_rejected() {
    let (_store, ledger) = memory_ledger();
    let product = Uuid::new_v4();
    let author = Uuid::new_v4();
    ledger.register_product(product).await.unwrap();

    ledger
        .add_review(ReviewFactory::for_product(product).by(author).rating(4).build())
        .await
        .unwrap();
    let before = ledger.aggregate(product).await.unwrap();

    let result = ledger
        .add_review(ReviewFactory::for_product(product).by(author).rating(1).build())
        .await;
    match result {
        Err(AppError::DuplicateReview {
            product_id,
            author_id,
        }) => {
            assert_eq!(product_id, product);
            assert_eq!(author_id, author);
        }
        other => panic!("expected DuplicateReview, got {:?}", other),
    }

    let after = ledger.aggregate(product).await.unwrap();
    assert_eq!(after, before);
}

#[test]
fn out_of_range_rating_never_reaches_the_ledger() {
    let author = storefront_lib::modules::reviews::ReviewAuthor::new(Uuid::new_v4(), "Ada");

    for rating in [0, 6, -1, 100] {
        let result = AddReviewCommand::new(Uuid::new_v4(), author.clone(), rating, "");
        assert!(matches!(result, Err(AppError::ValidationError(_))));
    }
}

#[tokio::test]
async fn user_gets_one_reaction_per_review() {
    let (_store, ledger) = memory_ledger();
    let product = Uuid::new_v4();
    let user = Uuid::new_v4();
    ledger.register_product(product).await.unwrap();

    let review = ledger
        .add_review(ReviewFactory::for_product(product).build())
        .await
        .unwrap();

    let reacted = ledger
        .react(ReactCommand::new(product, review.id(), user, Polarity::Agree))
        .await
        .unwrap();
    assert_eq!(reacted.agree_count(), 1);
    assert_eq!(reacted.disagree_count(), 0);

    for polarity in [Polarity::Agree, Polarity::Disagree] {
        let result = ledger
            .react(ReactCommand::new(product, review.id(), user, polarity))
            .await;
        assert!(matches!(result, Err(AppError::AlreadyReacted { .. })));
    }

    let aggregate = ledger.aggregate(product).await.unwrap();
    let stored = aggregate.find_review(&review.id()).unwrap();
    assert_eq!(stored.agree_count(), 1);
    assert_eq!(stored.disagree_count(), 0);
    assert_eq!(stored.reactions().len(), 1);
}

#[tokio::test]
async fn reacting_to_unknown_review_or_product_is_not_found() {
    let (_store, ledger) = memory_ledger();
    let product = Uuid::new_v4();
    ledger.register_product(product).await.unwrap();

    let missing_review = ledger
        .react(ReactCommand::new(
            product,
            Uuid::new_v4(),
            Uuid::new_v4(),
            Polarity::Disagree,
        ))
        .await;
    assert!(matches!(missing_review, Err(AppError::NotFound(_))));

    let missing_product = ledger
        .add_review(ReviewFactory::for_product(Uuid::new_v4()).build())
        .await;
    assert!(matches!(missing_product, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn reactions_are_visible_per_user() {
    let (_store, ledger) = memory_ledger();
    let product = Uuid::new_v4();
    let user = Uuid::new_v4();
    ledger.register_product(product).await.unwrap();

    let liked = ledger
        .add_review(ReviewFactory::for_product(product).rating(5).build())
        .await
        .unwrap();
    let disliked = ledger
        .add_review(ReviewFactory::for_product(product).rating(1).build())
        .await
        .unwrap();
    let untouched = ledger
        .add_review(ReviewFactory::for_product(product).rating(3).build())
        .await
        .unwrap();

    ledger
        .react(ReactCommand::new(product, liked.id(), user, Polarity::Agree))
        .await
        .unwrap();
    ledger
        .react(ReactCommand::new(product, disliked.id(), user, Polarity::Disagree))
        .await
        .unwrap();

    assert_eq!(
        ledger.reaction_of(product, liked.id(), user).await.unwrap(),
        Some(Polarity::Agree)
    );
    assert_eq!(
        ledger.reaction_of(product, untouched.id(), user).await.unwrap(),
        None
    );
    assert_err!(ledger.reaction_of(product, Uuid::new_v4(), user).await);

    let reactions = ledger.user_reactions(product, user).await.unwrap();
    assert_eq!(
        reactions,
        vec![
            UserReaction {
                review_id: liked.id(),
                polarity: Polarity::Agree,
            },
            UserReaction {
                review_id: disliked.id(),
                polarity: Polarity::Disagree,
            },
        ]
    );

    let stranger = ledger.user_reactions(product, Uuid::new_v4()).await.unwrap();
    assert!(stranger.is_empty());
}

#[tokio::test]
async fn concurrent_reviews_on_one_product_are_all_counted() {
    let (_store, ledger) = memory_ledger();
    let ledger = Arc::new(ledger);
    let product = Uuid::new_v4();
    ledger.register_product(product).await.unwrap();

    let writers = (0..40).map(|i| {
        let ledger = Arc::clone(&ledger);
        tokio::spawn(async move {
            ledger
                .add_review(
                    ReviewFactory::for_product(product)
                        .rating(i % 5 + 1)
                        .build(),
                )
                .await
        })
    });

    for result in join_all(writers).await {
        assert_ok!(result.unwrap());
    }

    let aggregate = ledger.aggregate(product).await.unwrap();
    assert_eq!(aggregate.review_count(), 40);
    assert_eq!(buckets(&aggregate), vec![(1, 8), (2, 8), (3, 8), (4, 8), (5, 8)]);
    assert_eq!(aggregate.average_rating(), 3.0);
    assert!(invariants::is_consistent(&aggregate));
}

#[tokio::test]
async fn concurrent_reactions_on_one_review_are_all_counted() {
    let (_store, ledger) = memory_ledger();
    let ledger = Arc::new(ledger);
    let product = Uuid::new_v4();
    ledger.register_product(product).await.unwrap();
    let review = ledger
        .add_review(ReviewFactory::for_product(product).build())
        .await
        .unwrap();
    let review_id = review.id();

    let reactors = (0..30).map(|i| {
        let ledger = Arc::clone(&ledger);
        let polarity = if i % 3 == 0 {
            Polarity::Disagree
        } else {
            Polarity::Agree
        };
        tokio::spawn(async move {
            ledger
                .react(ReactCommand::new(product, review_id, Uuid::new_v4(), polarity))
                .await
        })
    });

    for result in join_all(reactors).await {
        assert_ok!(result.unwrap());
    }

    let aggregate = ledger.aggregate(product).await.unwrap();
    let stored = aggregate.find_review(&review_id).unwrap();
    assert_eq!(stored.agree_count(), 20);
    assert_eq!(stored.disagree_count(), 10);
}

#[tokio::test]
async fn other_products_are_unaffected() {
    let (_store, ledger) = memory_ledger();
    let busy = Uuid::new_v4();
    let quiet = Uuid::new_v4();
    ledger.register_product(busy).await.unwrap();
    ledger.register_product(quiet).await.unwrap();

    ledger
        .add_review(ReviewFactory::for_product(busy).rating(1).build())
        .await
        .unwrap();

    assert_eq!(ledger.aggregate(quiet).await.unwrap(), ReviewAggregate::empty());
}

#[tokio::test]
async fn top_rated_orders_by_average_then_review_count() {
    let (_store, ledger) = memory_ledger();
    let solid = Uuid::new_v4();
    let lucky = Uuid::new_v4();
    let poor = Uuid::new_v4();
    let unrated = Uuid::new_v4();
    for product in [solid, lucky, poor, unrated] {
        ledger.register_product(product).await.unwrap();
    }

    for rating in [5, 5] {
        ledger
            .add_review(ReviewFactory::for_product(solid).rating(rating).build())
            .await
            .unwrap();
    }
    ledger
        .add_review(ReviewFactory::for_product(lucky).rating(5).build())
        .await
        .unwrap();
    ledger
        .add_review(ReviewFactory::for_product(poor).rating(2).build())
        .await
        .unwrap();

    let top = ledger.top_rated(None).await.unwrap();
    let order: Vec<Uuid> = top.iter().map(|entry| entry.product_id).collect();
    assert_eq!(order, vec![solid, lucky, poor]);
    assert_eq!(top[0].review_count, 2);
    assert_eq!(top[0].average_rating, 5.0);

    let everything = ledger.top_rated(Some(100)).await.unwrap();
    assert_eq!(everything.len(), 4);
    assert_eq!(everything[3].product_id, unrated);

    assert!(matches!(
        ledger.top_rated(Some(101)).await,
        Err(AppError::ValidationError(_))
    ));
}

#[tokio::test]
async fn product_lifecycle() {
    let (store, ledger) = memory_ledger();
    let product = Uuid::new_v4();

    let created = ledger.register_product(product).await.unwrap();
    assert!(created.is_empty());
    assert!(matches!(
        ledger.register_product(product).await,
        Err(AppError::ValidationError(_))
    ));

    ledger
        .add_review(ReviewFactory::for_product(product).build())
        .await
        .unwrap();
    assert_ok!(ledger.drop_product(product).await);
    assert!(store.is_empty());

    assert!(matches!(
        ledger.aggregate(product).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        ledger.drop_product(product).await,
        Err(AppError::NotFound(_))
    ));
}

/// Writes an aggregate whose stored statistics disagree with its reviews
async fn plant_drift(store: &dyn ProductStore, product: Uuid) {
    let stored = store.load(product).await.unwrap();
    let mut raw = serde_json::to_value(&stored.aggregate).unwrap();
    raw["starCounts"] = json!({ "5": 7 });
    raw["averageRating"] = json!(4.75);
    raw["reviews"][0]["agreeCount"] = json!(12);

    let drifted: ReviewAggregate = serde_json::from_value(raw).unwrap();
    assert!(!invariants::is_consistent(&drifted));
    store
        .save(product, &drifted, stored.version)
        .await
        .unwrap();
}

#[tokio::test]
async fn recompute_repairs_drift_once() {
    let (store, ledger) = memory_ledger();
    let product = Uuid::new_v4();
    ledger.register_product(product).await.unwrap();
    for rating in [5, 1] {
        ledger
            .add_review(ReviewFactory::for_product(product).rating(rating).build())
            .await
            .unwrap();
    }
    let healthy = ledger.aggregate(product).await.unwrap();

    plant_drift(store.as_ref(), product).await;

    let outcome = ledger.recompute_aggregate(product).await.unwrap();
    assert!(outcome.repaired);
    assert!(!outcome.violations.is_empty());
    assert_eq!(outcome.aggregate, healthy);
    assert_eq!(ledger.aggregate(product).await.unwrap(), healthy);

    let second = ledger.recompute_aggregate(product).await.unwrap();
    assert!(!second.repaired);
    assert!(second.violations.is_empty());
    assert_eq!(second.aggregate, healthy);
}

#[tokio::test]
async fn next_mutation_heals_drift() {
    let (store, ledger) = memory_ledger();
    let product = Uuid::new_v4();
    ledger.register_product(product).await.unwrap();
    ledger
        .add_review(ReviewFactory::for_product(product).rating(3).build())
        .await
        .unwrap();

    plant_drift(store.as_ref(), product).await;

    ledger
        .add_review(ReviewFactory::for_product(product).rating(5).build())
        .await
        .unwrap();

    let aggregate = ledger.aggregate(product).await.unwrap();
    assert!(invariants::is_consistent(&aggregate));
    assert_eq!(buckets(&aggregate), vec![(3, 1), (5, 1)]);
    assert_eq!(aggregate.average_rating(), 4.0);
    assert_eq!(aggregate.reviews()[0].agree_count(), 0);
}

#[tokio::test]
async fn sweep_repairs_what_it_can_and_reports_the_rest() {
    let (store, ledger) = memory_ledger();
    let clean = Uuid::new_v4();
    let drifted = Uuid::new_v4();
    let corrupt = Uuid::new_v4();

    for product in [clean, drifted, corrupt] {
        ledger.register_product(product).await.unwrap();
        ledger
            .add_review(ReviewFactory::for_product(product).rating(4).build())
            .await
            .unwrap();
    }

    plant_drift(store.as_ref(), drifted).await;

    // The same review twice cannot be fixed by recounting
    let stored = store.load(corrupt).await.unwrap();
    let mut raw = serde_json::to_value(&stored.aggregate).unwrap();
    let copy = raw["reviews"][0].clone();
    raw["reviews"].as_array_mut().unwrap().push(copy);
    let duplicated: ReviewAggregate = serde_json::from_value(raw).unwrap();
    store
        .save(corrupt, &duplicated, stored.version)
        .await
        .unwrap();

    let summary = ledger.recompute_all().await.unwrap();
    assert_eq!(summary.checked, 3);
    assert_eq!(summary.repaired, 1);
    assert_eq!(summary.failed.len(), 1);
    assert_eq!(summary.failed[0].product_id, corrupt);

    assert!(invariants::is_consistent(
        &ledger.aggregate(drifted).await.unwrap()
    ));

    let blocked = ledger
        .add_review(ReviewFactory::for_product(corrupt).build())
        .await;
    assert!(matches!(blocked, Err(AppError::InvariantViolation(_))));
}
