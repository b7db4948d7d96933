use std::{collections::VecDeque, sync::Arc};

use eyre::{eyre, OptionExt, Result};
use futures_util::{stream::FuturesUnordered, StreamExt};
use nft_core::core::{
    async_loop::AsyncLoop,
    bits::{CurrencyId, NftId},
    functional::{
        one_shot_reply, IntoObservableSingleArc, OneShotPublishSingle, OneShotSingleObserver,
        PublishSingle, SingleObserver,
    },
};
use parking_lot::RwLock;
use tokio::{
    select,
    sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender},
};

use crate::{
    model::{nft::ItemDetail, order::Order},
    net::http_client::NetworkError,
    service::nft_service::NftService,
};

use super::{
    cart_events::{CartError, CartEvent},
    cart_state::{CartState, DetailOutcome, Generation},
    slot::{CartAggregate, CartSlot},
    sort::{SortCriterion, SortPreference},
};

#[derive(Debug)]
pub enum CartCommand {
    Load,
    Sort(SortCriterion),
    RequestRemove(NftId),
    ConfirmRemove(NftId),
    Pay {
        currency_id: CurrencyId,
        reply: OneShotSingleObserver<Result<(), CartError>>,
    },
    Snapshot(OneShotSingleObserver<Arc<CartAggregate>>),
}

/// Results of remote calls, posted back to the loop by the tasks that made them.
enum CartCompletion {
    OrderLoaded {
        sequence: u64,
        result: Result<Order, NetworkError>,
    },
    DetailLoaded {
        generation: Generation,
        index: usize,
        id: NftId,
        result: Result<ItemDetail, NetworkError>,
    },
    Removed {
        id: NftId,
        result: Result<(), NetworkError>,
    },
    Paid {
        currency_id: CurrencyId,
        result: Result<(), NetworkError>,
        reply: OneShotSingleObserver<Result<(), CartError>>,
    },
}

/// Order mutations run one at a time, each computed from the slots at the
/// moment it starts.
enum Mutation {
    Remove(NftId),
    Pay {
        currency_id: CurrencyId,
        reply: OneShotSingleObserver<Result<(), CartError>>,
    },
}

/// Cart truth and everything needed to change it. Lives inside the loop task.
struct CartWorker {
    state: CartState,
    service: Arc<dyn NftService>,
    preference: SortPreference,
    observer: Arc<RwLock<SingleObserver<CartEvent>>>,
    completion_tx: UnboundedSender<CartCompletion>,
    mutations: VecDeque<Mutation>,
    mutation_in_flight: bool,
    /// Last order request issued, and the newest one whose answer was applied
    load_requested: u64,
    load_applied: u64,
}

impl CartWorker {
    fn new(
        service: Arc<dyn NftService>,
        preference: SortPreference,
        observer: Arc<RwLock<SingleObserver<CartEvent>>>,
        completion_tx: UnboundedSender<CartCompletion>,
    ) -> Self {
        Self {
            state: CartState::new(),
            service,
            preference,
            observer,
            completion_tx,
            mutations: VecDeque::new(),
            mutation_in_flight: false,
            load_requested: 0,
            load_applied: 0,
        }
    }

    fn publish(&self, event: CartEvent) {
        self.observer.read().publish_single(event);
    }

    fn aggregate(&self) -> Arc<CartAggregate> {
        Arc::new(self.state.aggregate())
    }

    fn publish_footer_if_settled(&mut self) {
        if self.state.settle_if_complete() {
            let aggregate = self.aggregate();
            if let Some(footer) = aggregate.footer() {
                tracing::info!(
                    "Cart settled with {} items totalling {}",
                    footer.item_count,
                    footer.total_price
                );
            }
            self.publish(CartEvent::FooterUpdated(aggregate));
        }
    }

    fn post(completion_tx: &UnboundedSender<CartCompletion>, completion: CartCompletion) {
        if completion_tx.send(completion).is_err() {
            tracing::debug!("Cart loop gone, dropping completion");
        }
    }

    fn handle_command(&mut self, command: CartCommand) {
        match command {
            CartCommand::Load => self.load(),
            CartCommand::Sort(criterion) => self.sort(criterion),
            CartCommand::RequestRemove(id) => self.request_remove(id),
            CartCommand::ConfirmRemove(id) => {
                self.mutations.push_back(Mutation::Remove(id));
                self.start_next_mutation();
            }
            CartCommand::Pay { currency_id, reply } => {
                self.mutations.push_back(Mutation::Pay { currency_id, reply });
                self.start_next_mutation();
            }
            CartCommand::Snapshot(reply) => reply.one_shot_publish_single(self.aggregate()),
        }
    }

    fn handle_completion(&mut self, completion: CartCompletion) {
        match completion {
            CartCompletion::OrderLoaded { sequence, result } => self.order_loaded(sequence, result),
            CartCompletion::DetailLoaded {
                generation,
                index,
                id,
                result,
            } => self.detail_loaded(generation, index, id, result),
            CartCompletion::Removed { id, result } => {
                self.mutation_in_flight = false;
                self.removed(id, result);
                self.start_next_mutation();
            }
            CartCompletion::Paid {
                currency_id,
                result,
                reply,
            } => {
                self.mutation_in_flight = false;
                self.paid(currency_id, result, reply);
                self.start_next_mutation();
            }
        }
    }

    fn load(&mut self) {
        self.load_requested += 1;
        let sequence = self.load_requested;
        tracing::info!("Loading cart, request {}", sequence);

        let service = self.service.clone();
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = service.load_order().await;
            Self::post(&completion_tx, CartCompletion::OrderLoaded { sequence, result });
        });
    }

    fn order_loaded(&mut self, sequence: u64, result: Result<Order, NetworkError>) {
        // Answers may overtake each other; an older snapshot must not win
        if sequence < self.load_applied {
            tracing::debug!(
                "Discarding order from request {}, request {} already applied",
                sequence,
                self.load_applied
            );
            return;
        }

        let order = match result {
            Ok(order) => order,
            Err(err) => {
                tracing::warn!("Failed to load order: {}", err);
                self.publish(CartEvent::Error(CartError::OrderLoadFailed(err)));
                return;
            }
        };

        self.load_applied = sequence;
        let generation = self.state.begin_cycle(order.item_ids.clone());
        tracing::info!(
            "Order {} has {} items, starting cycle {}",
            order.id,
            order.item_ids.len(),
            generation
        );

        self.fetch_details(generation, order.item_ids);
        self.publish(CartEvent::FullReload(self.aggregate()));
        self.publish_footer_if_settled();
    }

    /// One task drives every detail fetch of the cycle.
    fn fetch_details(&self, generation: Generation, item_ids: Vec<NftId>) {
        if item_ids.is_empty() {
            return;
        }

        let service = self.service.clone();
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let mut fetches: FuturesUnordered<_> = item_ids
                .into_iter()
                .enumerate()
                .map(|(index, id)| {
                    let service = service.clone();
                    async move {
                        let result = service.load_cart_item(&id).await;
                        (index, id, result)
                    }
                })
                .collect();

            while let Some((index, id, result)) = fetches.next().await {
                Self::post(
                    &completion_tx,
                    CartCompletion::DetailLoaded {
                        generation,
                        index,
                        id,
                        result,
                    },
                );
            }
        });
    }

    fn detail_loaded(
        &mut self,
        generation: Generation,
        index: usize,
        id: NftId,
        result: Result<ItemDetail, NetworkError>,
    ) {
        if let Err(err) = &result {
            tracing::warn!("Failed to load item {}: {}", id, err);
        }

        match self.state.apply_detail(generation, index, &id, result) {
            DetailOutcome::Applied { index } => {
                self.publish(CartEvent::SlotUpdated {
                    aggregate: self.aggregate(),
                    index,
                });
                self.publish_footer_if_settled();
            }
            DetailOutcome::Stale => {
                tracing::debug!("Discarding {} from cycle {}", id, generation);
            }
            DetailOutcome::Unmatched => {
                tracing::debug!("No pending slot for {} any more", id);
            }
        }
    }

    fn sort(&mut self, criterion: SortCriterion) {
        self.state.sort(criterion);
        if let Err(err) = self.preference.save(criterion) {
            tracing::warn!("Failed to store sort preference: {:?}", err);
        }
        self.publish(CartEvent::Sorted(self.aggregate()));
    }

    fn request_remove(&mut self, id: NftId) {
        let event = match self.state.find(&id) {
            Some(CartSlot::Ready(detail)) => CartEvent::ConfirmDelete {
                image_url: detail.image_url().map(str::to_owned),
                id,
            },
            Some(CartSlot::Failed(_, err)) => CartEvent::Error(CartError::ItemLoadFailed {
                source: err.clone(),
                id,
            }),
            Some(_) => CartEvent::Error(CartError::NotReady { id }),
            None => CartEvent::Error(CartError::UnknownItem { id }),
        };
        self.publish(event);
    }

    fn start_next_mutation(&mut self) {
        while !self.mutation_in_flight {
            let Some(mutation) = self.mutations.pop_front() else {
                return;
            };

            match mutation {
                Mutation::Remove(id) => {
                    if self.state.find(&id).is_none() {
                        self.publish(CartEvent::Error(CartError::UnknownItem { id }));
                        continue;
                    }

                    let item_ids = self.state.item_ids_without(&id);
                    tracing::info!("Removing {}, order keeps {} items", id, item_ids.len());
                    self.spawn_change_order(item_ids, move |result| CartCompletion::Removed {
                        id,
                        result,
                    });
                }
                Mutation::Pay { currency_id, reply } => {
                    let payable = self
                        .state
                        .all_settled()
                        .then(|| self.state.aggregate())
                        .and_then(|aggregate| aggregate.footer().map(|f| f.can_pay))
                        .unwrap_or(false);

                    if !payable {
                        reply.one_shot_publish_single(Err(CartError::PaymentUnavailable));
                        continue;
                    }

                    tracing::info!("Paying order with currency {}", currency_id);
                    self.spawn_change_order(vec![], move |result| CartCompletion::Paid {
                        currency_id,
                        result,
                        reply,
                    });
                }
            }
        }
    }

    fn spawn_change_order(
        &mut self,
        item_ids: Vec<NftId>,
        complete: impl FnOnce(Result<(), NetworkError>) -> CartCompletion + Send + 'static,
    ) {
        self.mutation_in_flight = true;
        let service = self.service.clone();
        let completion_tx = self.completion_tx.clone();
        tokio::spawn(async move {
            let result = service.change_order(&item_ids).await;
            Self::post(&completion_tx, complete(result));
        });
    }

    fn removed(&mut self, id: NftId, result: Result<(), NetworkError>) {
        if let Err(err) = result {
            tracing::warn!("Failed to remove {}: {}", id, err);
            self.publish(CartEvent::Error(CartError::mutation(err)));
            return;
        }

        let removed = self.state.remove(&id);
        tracing::info!("Removed {} slots of {}", removed, id);
        self.publish(CartEvent::FullReload(self.aggregate()));
        self.publish_footer_if_settled();
    }

    fn paid(
        &mut self,
        currency_id: CurrencyId,
        result: Result<(), NetworkError>,
        reply: OneShotSingleObserver<Result<(), CartError>>,
    ) {
        if let Err(err) = result {
            tracing::warn!("Payment with {} failed: {}", currency_id, err);
            reply.one_shot_publish_single(Err(CartError::mutation(err)));
            return;
        }

        let generation = self.state.begin_cycle(vec![]);
        tracing::info!("Payment completed, cart emptied in cycle {}", generation);

        self.publish(CartEvent::FullReload(self.aggregate()));
        self.publish_footer_if_settled();
        self.publish(CartEvent::PaymentCompleted { currency_id });
        reply.one_shot_publish_single(Ok(()));
    }
}

/// Cheap sender side of the cart, handed to whoever drives it.
#[derive(Clone)]
pub struct CartHandle {
    command_tx: UnboundedSender<CartCommand>,
    preference: SortPreference,
}

impl CartHandle {
    fn send(&self, command: CartCommand) -> Result<(), CartError> {
        self.command_tx
            .send(command)
            .map_err(|_| CartError::Stopped)
    }

    pub fn load_cart(&self) -> Result<(), CartError> {
        self.send(CartCommand::Load)
    }

    pub fn sort_by(&self, criterion: SortCriterion) -> Result<(), CartError> {
        self.send(CartCommand::Sort(criterion))
    }

    pub fn request_remove(&self, id: NftId) -> Result<(), CartError> {
        self.send(CartCommand::RequestRemove(id))
    }

    pub fn confirm_remove(&self, id: NftId) -> Result<(), CartError> {
        self.send(CartCommand::ConfirmRemove(id))
    }

    pub async fn pay(&self, currency_id: CurrencyId) -> Result<(), CartError> {
        let (reply, rx) = one_shot_reply();
        self.send(CartCommand::Pay { currency_id, reply })?;
        rx.await.map_err(|_| CartError::Stopped)?
    }

    pub async fn snapshot(&self) -> Result<Arc<CartAggregate>, CartError> {
        let (reply, rx) = one_shot_reply();
        self.send(CartCommand::Snapshot(reply))?;
        rx.await.map_err(|_| CartError::Stopped)
    }

    /// Criterion chosen last time, for the view to pre-select.
    pub fn saved_sort(&self) -> Option<SortCriterion> {
        self.preference.load().unwrap_or_else(|err| {
            tracing::warn!("Failed to read sort preference: {:?}", err);
            None
        })
    }
}

/// Single writer of cart state. Commands and remote completions are handled
/// one at a time on the loop task, and every change is published to the
/// observer as a [`CartEvent`].
pub struct CartStateMachine {
    observer: Arc<RwLock<SingleObserver<CartEvent>>>,
    service: Arc<dyn NftService>,
    preference: SortPreference,
    command_loop: AsyncLoop<UnboundedReceiver<CartCommand>>,
    command_tx: UnboundedSender<CartCommand>,
    command_rx: Option<UnboundedReceiver<CartCommand>>,
}

impl CartStateMachine {
    pub fn new(service: Arc<dyn NftService>, preference: SortPreference) -> Self {
        let (command_tx, command_rx) = unbounded_channel();
        Self {
            observer: Arc::new(RwLock::new(SingleObserver::new())),
            service,
            preference,
            command_loop: AsyncLoop::new(),
            command_tx,
            command_rx: Some(command_rx),
        }
    }

    pub fn handle(&self) -> CartHandle {
        CartHandle {
            command_tx: self.command_tx.clone(),
            preference: self.preference.clone(),
        }
    }

    pub fn start(&mut self) -> Result<()> {
        let mut command_rx = self
            .command_rx
            .take()
            .ok_or_eyre("Cart already started")?;

        let (completion_tx, mut completion_rx) = unbounded_channel();
        let mut worker = CartWorker::new(
            self.service.clone(),
            self.preference.clone(),
            self.observer.clone(),
            completion_tx,
        );

        self.command_loop.start(move |cancel_token| async move {
            tracing::info!("Cart loop started");
            loop {
                select! {
                    _ = cancel_token.cancelled() => {
                        break
                    },
                    Some(command) = command_rx.recv() => {
                        tracing::debug!("Cart command {:?}", command);
                        worker.handle_command(command);
                    },
                    Some(completion) = completion_rx.recv() => {
                        worker.handle_completion(completion);
                    },
                }
            }
            tracing::info!("Cart loop exited");
            command_rx
        })
    }

    /// Stop the loop. Cart state is dropped; a restarted machine begins empty.
    pub async fn stop(&mut self) -> Result<()> {
        let command_rx = self
            .command_loop
            .stop()
            .await
            .map_err(|err| eyre!("Failed to stop cart: {:?}", err))?;
        self.command_rx = Some(command_rx);
        Ok(())
    }
}

impl IntoObservableSingleArc<CartEvent> for CartStateMachine {
    fn get_single_observer_arc(&self) -> &Arc<RwLock<SingleObserver<CartEvent>>> {
        &self.observer
    }
}
