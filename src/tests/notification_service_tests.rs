//! tests/notification_service_tests.rs
//! Pruebas de `NotificationService`: alta síncrona y despacho en segundo plano.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    use crate::errors::{ServiceError, StorageError};
    use crate::models::notification_model::{
        Channel, CreateNotificationRequest, NotificationStatus,
    };
    use crate::services::memory_store::MemoryNotificationStore;
    use crate::services::notification_store::NotificationStore;
    use crate::tests::{fast_config, service_with, wait_for_terminal, FixedSequence, FlakyStore};

    fn request(user_id: i64, message: &str, channel: Channel) -> CreateNotificationRequest {
        CreateNotificationRequest {
            user_id,
            message: message.to_string(),
            channel,
        }
    }

    #[actix_rt::test]
    async fn test_submit_returns_pending_immediately() {
        let store = Arc::new(MemoryNotificationStore::new());
        // delay largo: el despacho no puede adelantarse a las lecturas
        let mut config = fast_config(3, 0.0);
        config.messaging_delay = Duration::from_millis(500);
        let service = service_with(
            store.clone(),
            config,
            Arc::new(FixedSequence::new(vec![0.9])),
        );

        let start = Instant::now();
        let created = service
            .submit(request(42, "code: 123456", Channel::Messaging))
            .await
            .unwrap();
        assert!(start.elapsed() < Duration::from_millis(500));

        assert_eq!(created.status, NotificationStatus::Pending);
        assert_eq!(created.attempts, 0);
        assert_eq!(service.tracker().in_flight(), 1);

        // leído antes de que termine el primer delay
        let listed = service.list_for_user(42, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, NotificationStatus::Pending);
        assert_eq!(listed[0].attempts, 0);
    }

    #[actix_rt::test]
    async fn test_scenario_messaging_sent_on_first_attempt() {
        let store = Arc::new(MemoryNotificationStore::new());
        let service = service_with(
            store.clone(),
            fast_config(3, 0.0),
            Arc::new(FixedSequence::new(vec![0.9])),
        );

        let created = service
            .submit(request(42, "code: 123456", Channel::Messaging))
            .await
            .unwrap();
        assert_eq!(created.status, NotificationStatus::Pending);

        wait_for_terminal(store.as_ref(), created.id, Duration::from_secs(2)).await;

        let listed = service.list_for_user(42, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, NotificationStatus::Sent);
        assert_eq!(listed[0].attempts, 1);

        assert!(service.tracker().wait_idle(Duration::from_secs(1)).await);
        assert_eq!(service.tracker().in_flight(), 0);
    }

    #[actix_rt::test]
    async fn test_validation_error_creates_nothing() {
        let store = Arc::new(MemoryNotificationStore::new());
        let service = service_with(
            store.clone(),
            fast_config(3, 0.0),
            Arc::new(FixedSequence::new(vec![0.9])),
        );

        for bad in [
            request(1, "   ", Channel::Email),
            request(-5, "hola", Channel::Email),
            request(1, &"x".repeat(5000), Channel::Email),
        ] {
            let result = service.submit(bad).await;
            assert!(matches!(result, Err(ServiceError::Validation(_))));
        }

        assert!(store.list_by_user(1, None).await.unwrap().is_empty());
        assert_eq!(service.tracker().in_flight(), 0);
    }

    #[actix_rt::test]
    async fn test_storage_error_on_create_is_propagated() {
        let store = Arc::new(FlakyStore {
            fail_create: true,
            ..Default::default()
        });
        let service = service_with(
            store.clone(),
            fast_config(3, 0.0),
            Arc::new(FixedSequence::new(vec![0.9])),
        );

        let result = service.submit(request(9, "hola", Channel::Email)).await;
        assert!(matches!(
            result,
            Err(ServiceError::Storage(StorageError::Database(_)))
        ));
        // no se despacha nada
        assert_eq!(service.tracker().in_flight(), 0);
        assert_eq!(store.update_calls(), 0);
    }

    #[actix_rt::test]
    async fn test_users_do_not_see_each_other() {
        let store = Arc::new(MemoryNotificationStore::new());
        let service = service_with(
            store.clone(),
            fast_config(3, 0.5),
            Arc::new(FixedSequence::new(vec![0.2, 0.7])),
        );

        let (a, b) = futures::join!(
            service.submit(request(501, "para 501", Channel::Messaging)),
            service.submit(request(502, "para 502", Channel::Email)),
        );
        let (a, b) = (a.unwrap(), b.unwrap());

        wait_for_terminal(store.as_ref(), a.id, Duration::from_secs(2)).await;
        wait_for_terminal(store.as_ref(), b.id, Duration::from_secs(2)).await;

        let for_a = service.list_for_user(501, None).await.unwrap();
        let for_b = service.list_for_user(502, None).await.unwrap();
        assert_eq!(for_a.len(), 1);
        assert_eq!(for_b.len(), 1);
        assert!(for_a.iter().all(|n| n.user_id == 501));
        assert!(for_b.iter().all(|n| n.user_id == 502));
    }

    #[actix_rt::test]
    async fn test_attempts_never_exceed_max_under_load() {
        let store = Arc::new(MemoryNotificationStore::new());
        let config = fast_config(4, 0.7);
        let service = service_with(
            store.clone(),
            config.clone(),
            Arc::new(crate::services::dispatch_policy::SeededRandom::new(2024)),
        );

        let mut ids = Vec::new();
        for i in 0..25 {
            let channel = if i % 2 == 0 {
                Channel::Email
            } else {
                Channel::Messaging
            };
            ids.push(service.submit(request(77, "carga", channel)).await.unwrap().id);
        }

        assert!(service.tracker().wait_idle(Duration::from_secs(5)).await);

        let all = service.list_for_user(77, None).await.unwrap();
        assert_eq!(all.len(), ids.len());
        for n in &all {
            assert!(n.attempts >= 1 && n.attempts <= config.max_attempts);
            assert_eq!(n.status, NotificationStatus::Sent);
        }
    }

    #[actix_rt::test]
    async fn test_wait_idle_times_out_with_work_in_flight() {
        let store = Arc::new(MemoryNotificationStore::new());
        let mut config = fast_config(3, 0.0);
        config.email_delay = Duration::from_millis(300);
        let service = service_with(store, config, Arc::new(FixedSequence::new(vec![0.9])));

        service
            .submit(request(1, "lento", Channel::Email))
            .await
            .unwrap();
        assert!(!service.tracker().wait_idle(Duration::from_millis(20)).await);
        assert_eq!(service.tracker().in_flight(), 1);
        assert!(service.tracker().wait_idle(Duration::from_secs(2)).await);
    }
}
