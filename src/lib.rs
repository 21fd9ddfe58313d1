//! # patina-oauth
//!
//! An embeddable OAuth 2.0 and OpenID Connect authorization server core, for
//! use behind whatever http front-end the host already runs, featuring
//! pluggable back-ends for persistence and identity.
//!
//! ## About
//!
//! `patina-oauth` implements the protocol state machines of an authorization
//! server, that is the five token grants of [RFC 6749] with proof keys
//! ([RFC 7636]), token introspection ([RFC 7662]), token revocation
//! ([RFC 7009]) and the OpenID Connect userinfo endpoint, while owning no
//! transport, no storage engine and no user directory. The main interface is
//! designed around traits
//! in both directions: the host feeds http-shaped [`oauth::request::Envelope`]
//! values in and receives outcomes through small application callbacks, and
//! the core reaches its data through the store traits of [`primitives`].
//!
//! ## Embedding the core
//!
//! First, a set of [`primitives`] needs to be chosen: a
//! [`ClientStore`](primitives::client::ClientStore) for registered clients, a
//! [`TokenStore`](primitives::token::TokenStore) for issued credentials, a
//! [`ScopeStore`](primitives::ScopeStore) for the administered scopes and a
//! [`ResourceOwners`](primitives::resource_owner::ResourceOwners) directory
//! answering for the end-users. There is a simple, in-memory implementation
//! provided for each store; production deployments will usually implement the
//! traits over their own database.
//!
//! Next, bundle the chosen back-ends into an [`oauth::Endpoint`], in simple
//! cases an instantiation of [`endpoint::Generic`], and route each http
//! request to the matching entry point in [`endpoint`], together with an
//! application callback that turns the outcome into a response of the host's
//! web framework. Error envelopes know whether they belong in the response
//! body or on the client's redirect uri, and in which component.
//!
//! The core is synchronous and single-request-scoped: every entry point is a
//! plain function of the request and the back-ends, holding no locks and
//! spawning nothing, so hosts are free to wrap calls in their own runtime.
//!
//! [RFC 6749]: https://tools.ietf.org/html/rfc6749
//! [RFC 7009]: https://tools.ietf.org/html/rfc7009
//! [RFC 7636]: https://tools.ietf.org/html/rfc7636
//! [RFC 7662]: https://tools.ietf.org/html/rfc7662
#![warn(missing_docs)]

pub mod endpoint;
pub mod oauth;
pub mod primitives;
