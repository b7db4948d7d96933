use core::fmt;
use std::{any::type_name, sync::Arc};

use parking_lot::RwLock;
use tokio::sync::oneshot;

/// Handler consumed together with the notification. Used for replies to
/// commands, where exactly one answer is ever delivered.
pub trait OneShotNotificationHandlerOnce<T>: Send + Sync {
    fn handle_notification(self: Box<Self>, notification: T);
}

impl<F, T> OneShotNotificationHandlerOnce<T> for F
where
    F: FnOnce(T) + Send + Sync,
{
    fn handle_notification(self: Box<Self>, notification: T) {
        (self)(notification)
    }
}

pub trait IntoOneShotNotificationHandlerOnceBox<T> {
    fn into_one_shot_notification_handler_once_box(
        self,
    ) -> Box<dyn OneShotNotificationHandlerOnce<T>>;
}

pub trait OneShotPublishSingle<T> {
    fn one_shot_publish_single(self, notification: T);
}

pub struct OneShotSingleObserver<T> {
    observer: Option<Box<dyn OneShotNotificationHandlerOnce<T>>>,
}

// Replies are carried inside commands, and commands are logged with Debug.
impl<T> fmt::Debug for OneShotSingleObserver<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OneShotSingleObserver(<reply>)")
    }
}

impl<T> OneShotSingleObserver<T> {
    pub fn new() -> Self {
        Self { observer: None }
    }

    pub fn new_with_observer(observer: Box<dyn OneShotNotificationHandlerOnce<T>>) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    pub fn new_from(value: impl IntoOneShotNotificationHandlerOnceBox<T>) -> Self {
        Self::new_with_observer(value.into_one_shot_notification_handler_once_box())
    }

    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }
}

impl<T> Default for OneShotSingleObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> OneShotPublishSingle<T> for OneShotSingleObserver<T> {
    fn one_shot_publish_single(self, notification: T) {
        if let Some(observer) = self.observer {
            observer.handle_notification(notification);
        }
    }
}

/// Observer reused for every event, each event is moved into it.
pub trait NotificationHandlerOnce<T>: Send + Sync {
    fn handle_notification(&self, notification: T);
}

impl<F, T> NotificationHandlerOnce<T> for F
where
    F: Fn(T) + Send + Sync,
{
    fn handle_notification(&self, notification: T) {
        (self)(notification)
    }
}

pub trait IntoNotificationHandlerOnceBox<T> {
    fn into_notification_handler_once_box(self) -> Box<dyn NotificationHandlerOnce<T>>;
}

pub trait PublishSingle<T> {
    fn publish_single(&self, notification: T);
}

pub struct SingleObserver<T> {
    observer: Option<Box<dyn NotificationHandlerOnce<T>>>,
}

impl<T> SingleObserver<T> {
    pub fn new() -> Self {
        Self { observer: None }
    }

    pub fn new_with_observer(observer: Box<dyn NotificationHandlerOnce<T>>) -> Self {
        Self {
            observer: Some(observer),
        }
    }

    pub fn has_observer(&self) -> bool {
        self.observer.is_some()
    }

    /// There is only single observer that can be set, and so we call it 'set'
    pub fn set_observer(&mut self, observer: Box<dyn NotificationHandlerOnce<T>>) {
        self.observer = Some(observer);
    }

    pub fn set_observer_from(&mut self, observer: impl IntoNotificationHandlerOnceBox<T>) {
        self.observer = Some(observer.into_notification_handler_once_box());
    }
}

impl<T> Default for SingleObserver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> PublishSingle<T> for SingleObserver<T> {
    fn publish_single(&self, notification: T) {
        if let Some(observer) = &self.observer {
            observer.handle_notification(notification);
        } else {
            tracing::trace!("No observer for {}", type_name::<T>());
        }
    }
}

pub trait IntoObservableSingleArc<T>: Send + Sync {
    fn get_single_observer_arc(&self) -> &Arc<RwLock<SingleObserver<T>>>;
}

/// Adapters for delivering notifications into tokio channels, so that async
/// consumers can simply `recv().await` on them.
pub mod channels {
    use std::any::type_name;

    use tokio::sync::{mpsc::UnboundedSender, oneshot};

    use super::{
        IntoNotificationHandlerOnceBox, IntoOneShotNotificationHandlerOnceBox,
        NotificationHandlerOnce, OneShotNotificationHandlerOnce,
    };

    impl<T> OneShotNotificationHandlerOnce<T> for oneshot::Sender<T>
    where
        T: Send + Sync,
    {
        fn handle_notification(self: Box<Self>, notification: T) {
            if (*self).send(notification).is_err() {
                tracing::warn!("Reply receiver dropped for {}", type_name::<T>());
            }
        }
    }

    impl<T> IntoOneShotNotificationHandlerOnceBox<T> for oneshot::Sender<T>
    where
        T: Send + Sync + 'static,
    {
        fn into_one_shot_notification_handler_once_box(
            self,
        ) -> Box<dyn OneShotNotificationHandlerOnce<T>> {
            Box::new(self)
        }
    }

    impl<T> NotificationHandlerOnce<T> for UnboundedSender<T>
    where
        T: Send + Sync,
    {
        fn handle_notification(&self, notification: T) {
            if let Err(err) = self.send(notification) {
                tracing::warn!("Failed to send {}: {}", type_name::<T>(), err);
            }
        }
    }

    impl<T> IntoNotificationHandlerOnceBox<T> for UnboundedSender<T>
    where
        T: Send + Sync + 'static,
    {
        fn into_notification_handler_once_box(self) -> Box<dyn NotificationHandlerOnce<T>> {
            Box::new(self)
        }
    }
}

/// Creates a reply observer paired with the receiver awaiting it.
pub fn one_shot_reply<T>() -> (OneShotSingleObserver<T>, oneshot::Receiver<T>)
where
    T: Send + Sync + 'static,
{
    let (tx, rx) = oneshot::channel();
    (OneShotSingleObserver::new_from(tx), rx)
}
