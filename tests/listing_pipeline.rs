mod common;

use std::sync::{Arc, atomic::Ordering};

use artisan_marketplace_api::{
    ai::ImageInput,
    client::{ListingPipeline, MarketplaceApi, PipelineError, PipelineState},
    models::ListingStatus,
    services::listing_service::{self, MAX_IMAGES},
};
use common::{FakeMarketplace, image};

fn pipeline(api: &Arc<FakeMarketplace>) -> ListingPipeline {
    ListingPipeline::new(api.clone() as Arc<dyn MarketplaceApi>)
}

#[tokio::test]
async fn voice_to_published_listing() {
    let api = Arc::new(FakeMarketplace::default());
    let mut flow = pipeline(&api);
    assert_eq!(flow.state(), PipelineState::CapturingVoice);

    flow.record_transcript("A terracotta planter, hand thrown").unwrap();
    flow.attach_images(vec![image("front.jpg"), image("side.jpg")]).unwrap();
    assert_eq!(flow.state(), PipelineState::ImagesAttached);

    let draft = flow.generate().await.unwrap();
    assert!(draft.fallback_used);
    assert_eq!(flow.state(), PipelineState::Generated);
    let listing_id = flow.listing_id().unwrap();

    flow.edit(|edits| {
        edits.title = Some("Terracotta Planter".into());
        edits.price = Some(59_900);
    })
    .unwrap();
    assert_eq!(flow.state(), PipelineState::Editing);

    let published = flow.publish().await.unwrap();
    assert_eq!(published.status, ListingStatus::Active);
    assert_eq!(flow.state(), PipelineState::Published);

    let updates = api.updates.lock().unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].0, listing_id);
    assert_eq!(updates[0].1.title.as_deref(), Some("Terracotta Planter"));
    assert_eq!(
        api.status_changes.lock().unwrap().as_slice(),
        &[(listing_id, ListingStatus::Active)]
    );
}

#[tokio::test]
async fn steps_out_of_order_are_rejected() {
    let api = Arc::new(FakeMarketplace::default());
    let mut flow = pipeline(&api);

    assert!(matches!(
        flow.attach_images(vec![image("a.jpg")]),
        Err(PipelineError::InvalidTransition { .. })
    ));
    assert!(matches!(
        flow.generate().await,
        Err(PipelineError::InvalidTransition { .. })
    ));
    assert!(matches!(
        flow.edit(|_| {}),
        Err(PipelineError::InvalidTransition { .. })
    ));
    assert!(matches!(
        flow.publish().await,
        Err(PipelineError::InvalidTransition { .. })
    ));

    flow.record_transcript("Brass lamp").unwrap();
    flow.attach_images(vec![image("a.jpg")]).unwrap();
    assert!(matches!(
        flow.record_transcript("again"),
        Err(PipelineError::InvalidTransition {
            from: PipelineState::ImagesAttached,
            ..
        })
    ));
    assert_eq!(flow.state(), PipelineState::ImagesAttached);
}

#[tokio::test]
async fn input_is_validated() {
    let api = Arc::new(FakeMarketplace::default());
    let mut flow = pipeline(&api);

    assert!(matches!(
        flow.record_transcript("   "),
        Err(PipelineError::Validation(_))
    ));
    flow.record_transcript("Woven basket").unwrap();

    assert!(matches!(flow.attach_images(Vec::new()), Err(PipelineError::Validation(_))));
    let pdf = ImageInput {
        filename: "notes.pdf".into(),
        content_type: "application/pdf".into(),
        bytes: vec![1],
    };
    assert!(matches!(flow.attach_images(vec![pdf]), Err(PipelineError::Validation(_))));
    assert_eq!(flow.state(), PipelineState::CapturingVoice);
}

#[tokio::test]
async fn images_follow_the_upload_rules() {
    let api = Arc::new(FakeMarketplace::default());
    let mut flow = pipeline(&api);
    flow.record_transcript("Block-printed cushion covers").unwrap();

    let too_many: Vec<_> = (0..=MAX_IMAGES).map(|i| image(&format!("{i}.jpg"))).collect();
    let err = flow.attach_images(too_many.clone()).unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
    assert_eq!(
        listing_service::validate_images(&too_many).unwrap_err().to_string(),
        format!("Bad Request {err}"),
    );

    let empty = ImageInput {
        filename: "blank.jpg".into(),
        content_type: "image/jpeg".into(),
        bytes: Vec::new(),
    };
    assert!(matches!(flow.attach_images(vec![empty]), Err(PipelineError::Validation(_))));

    let most: Vec<_> = (0..MAX_IMAGES).map(|i| image(&format!("{i}.jpg"))).collect();
    flow.attach_images(most).unwrap();
    assert_eq!(flow.state(), PipelineState::ImagesAttached);
}

#[tokio::test]
async fn failed_generate_keeps_state() {
    let api = Arc::new(FakeMarketplace::default());
    api.fail_generate.store(true, Ordering::SeqCst);
    let mut flow = pipeline(&api);
    flow.record_transcript("Silk scarf").unwrap();
    flow.attach_images(vec![image("scarf.jpg")]).unwrap();

    assert!(matches!(flow.generate().await, Err(PipelineError::Api(_))));
    assert_eq!(flow.state(), PipelineState::ImagesAttached);
    assert!(flow.draft().is_none());

    api.fail_generate.store(false, Ordering::SeqCst);
    flow.generate().await.unwrap();
    assert_eq!(flow.state(), PipelineState::Generated);
}

#[tokio::test]
async fn failed_publish_keeps_state() {
    let api = Arc::new(FakeMarketplace::default());
    api.fail_status.store(true, Ordering::SeqCst);
    let mut flow = pipeline(&api);
    flow.record_transcript("Clay pot").unwrap();
    flow.attach_images(vec![image("pot.jpg")]).unwrap();
    flow.generate().await.unwrap();

    assert!(matches!(flow.publish().await, Err(PipelineError::Api(_))));
    assert_eq!(flow.state(), PipelineState::Generated);
    assert!(flow.published().is_none());

    flow.edit(|edits| edits.price = Some(0)).unwrap();
    assert!(matches!(flow.publish().await, Err(PipelineError::Validation(_))));
    assert_eq!(flow.state(), PipelineState::Editing);
}
