pub mod app {
    pub mod application;
    pub mod cart;
    pub mod config;
    pub mod nft_service;
}

pub mod cart {
    pub mod cart_events;
    pub mod cart_state;
    pub mod cart_state_machine;
    pub mod checkout;
    pub mod delete_confirmation;
    pub mod slot;
    pub mod sort;
}

pub mod cli;

pub mod model {
    pub mod collation;
    pub mod currency;
    pub mod nft;
    pub mod order;
}

pub mod net {
    pub mod endpoints;
    pub mod http_client;
    pub mod reqwest_client;
}

pub mod service {
    pub mod collections;
    pub mod item_cache;
    pub mod nft_service;
    pub mod nft_state;
}
