//! Account operations: registration, login, token checks, password and kind
//! changes, and removal.

use bastion_auth::{Rejection, Verdict};
use bastion_core::{
  AccountKind, Envelope, Extra, Indicator, Role,
  account::{Account, AccountFilter, AccountPatch, NewAccount},
  gate,
  store::{Store, UnitOfWork, Work},
};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  Operation, RequestContext, Service, abort, abort_with, commit, read_back,
  report, unless_conflict,
};

/// What a valid token says about its holder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenHolder {
  pub account_name: String,
  pub account_kind: AccountKind,
  pub role:         Role,
  pub issued_at:    i64,
  pub expires_at:   i64,
}

impl<S: Store> Service<S> {
  pub async fn query_all_accounts(&self, ctx: &RequestContext) -> Envelope<Account> {
    self
      .guarded(ctx, Operation::QueryAllAccounts, |uow| {
        commit(uow.accounts().find_by(&AccountFilter::default(), &())?)
      })
      .await
  }

  /// Checks run in a fixed order: the account exists, the password matches,
  /// then the requested login type equals the stored kind.
  pub async fn account_login(
    &self,
    ctx: &RequestContext,
    account_name: &str,
    password: &str,
    login_type: AccountKind,
  ) -> Envelope<Account> {
    let op = Operation::AccountLogin;
    if let Err(denied) = self.admit(ctx, op) {
      return denied;
    }
    let name = account_name.to_owned();
    let found = self.fetch(op, move |uow| account_named(uow, name)).await;
    let Some(account) = found.data().first() else {
      return report(op, found);
    };

    match self.verify_secret(password, &account.password_hash).await {
      Ok(true) => {}
      Ok(false) => return report(op, Envelope::failure(Indicator::IncorrectPwd)),
      Err(e) => {
        tracing::error!(operation = %op, error = %e, "password verification failed");
        return Envelope::internal(e);
      }
    }
    if !gate::kind_matches(account.account_kind, login_type) {
      return report(op, Envelope::failure(Indicator::InvalidLoginType));
    }
    self.with_token(op, report(op, found))
  }

  /// Report whether `token` is currently valid. `extra` carries the expiry
  /// (seconds since the epoch), or `-1` when the token is not accepted.
  pub async fn check_token(
    &self,
    ctx: &RequestContext,
    token: &str,
  ) -> Envelope<TokenHolder> {
    if let Err(denied) = self.admit(ctx, Operation::CheckToken) {
      return denied;
    }
    match self.tokens.validate(token) {
      Verdict::Valid(valid) => Envelope::success(vec![TokenHolder {
        account_name: valid.subject_id,
        account_kind: valid.account_kind,
        role:         valid.account_kind.role(),
        issued_at:    valid.issued_at,
        expires_at:   valid.expires_at,
      }])
      .with_extra(Extra::ExpiresAt(valid.expires_at)),
      Verdict::Invalid(Rejection::Expired) => {
        Envelope::failure(Indicator::TokenExpired).with_extra(Extra::ExpiresAt(-1))
      }
      Verdict::Invalid(_) => {
        Envelope::failure(Indicator::InvalidToken).with_extra(Extra::ExpiresAt(-1))
      }
    }
  }

  /// A name already in use yields `EXISTED` with the account holding it.
  pub async fn account_registry(
    &self,
    ctx: &RequestContext,
    account_name: &str,
    password: &str,
    account_kind: AccountKind,
  ) -> Envelope<Account> {
    let op = Operation::AccountRegistry;
    if let Err(denied) = self.admit(ctx, op) {
      return denied;
    }
    let password_hash = match self.hash_secret(password).await {
      Ok(hash) => hash,
      Err(e) => {
        tracing::error!(operation = %op, error = %e, "password hashing failed");
        return Envelope::internal(e);
      }
    };
    let name = account_name.to_owned();

    let envelope = self
      .run(op, move |uow| {
        let filter = AccountFilter::by_name(name.clone());
        let holders = uow.accounts().find_by(&filter, &())?;
        if !holders.is_empty() {
          return abort_with(Indicator::Existed, holders);
        }
        let new = NewAccount { account_name: name, password_hash, account_kind };
        let Some(id) = unless_conflict(uow.accounts().insert(new))? else {
          return abort_with(Indicator::Existed, uow.accounts().find_by(&filter, &())?);
        };
        read_back(uow.accounts().find_by_key(id, &())?)
      })
      .await;
    self.with_token(op, envelope)
  }

  /// Only the account holder or an administrator may change a password.
  pub async fn modify_password(
    &self,
    ctx: &RequestContext,
    account_name: &str,
    new_password: &str,
  ) -> Envelope<Account> {
    let op = Operation::ModifyPassword;
    if let Err(denied) = self.admit(ctx, op) {
      return denied;
    }
    let password_hash = match self.hash_secret(new_password).await {
      Ok(hash) => hash,
      Err(e) => {
        tracing::error!(operation = %op, error = %e, "password hashing failed");
        return Envelope::internal(e);
      }
    };
    let identity = ctx.identity().clone();
    let name = account_name.to_owned();

    let envelope = self
      .run(op, move |uow| {
        let Some(account) =
          uow.accounts().find_by(&AccountFilter::by_name(name.clone()), &())?.pop()
        else {
          return abort(Indicator::NotFound);
        };
        let is_holder = identity.is_authenticated() && identity.subject_id == name;
        if !is_holder && !gate::authorize(Some(&identity), Role::Admin).is_allowed() {
          return abort(Indicator::Unauthorized);
        }
        let patch = AccountPatch { password_hash: Some(password_hash), ..AccountPatch::default() };
        if !uow.accounts().update(account.account_id, patch)? {
          return abort(Indicator::NotFound);
        }
        read_back(uow.accounts().find_by_key(account.account_id, &())?)
      })
      .await;
    self.with_token(op, envelope)
  }

  /// Permanently remove an account after re-checking its password. The
  /// delete only goes ahead if the stored hash is still the one verified.
  pub async fn account_destroy(
    &self,
    ctx: &RequestContext,
    account_name: &str,
    password: &str,
  ) -> Envelope<Account> {
    let op = Operation::AccountDestroy;
    if let Err(denied) = self.admit(ctx, op) {
      return denied;
    }
    let name = account_name.to_owned();
    let found = self.fetch(op, move |uow| account_named(uow, name)).await;
    let Some(account) = found.data().first() else {
      return report(op, found);
    };

    match self.verify_secret(password, &account.password_hash).await {
      Ok(true) => {}
      Ok(false) => return report(op, Envelope::failure(Indicator::IncorrectPwd)),
      Err(e) => {
        tracing::error!(operation = %op, error = %e, "password verification failed");
        return Envelope::internal(e);
      }
    }

    let account_id = account.account_id;
    let verified = account.password_hash.clone();
    self
      .run(op, move |uow| {
        match uow.accounts().find_by_key(account_id, &())? {
          None => return abort(Indicator::NotFound),
          Some(current) if current.password_hash != verified => {
            return abort(Indicator::IncorrectPwd);
          }
          Some(_) => {}
        }
        if !uow.accounts().delete(account_id)? {
          return abort(Indicator::NotFound);
        }
        commit(Vec::new())
      })
      .await
  }

  /// Promote or demote an account.
  pub async fn account_level_mutate(
    &self,
    ctx: &RequestContext,
    account_id: Uuid,
    account_kind: AccountKind,
  ) -> Envelope<Account> {
    self
      .guarded(ctx, Operation::AccountLevelMutate, move |uow| {
        if uow.accounts().find_by_key(account_id, &())?.is_none() {
          return abort(Indicator::NotFound);
        }
        let patch = AccountPatch { account_kind: Some(account_kind), ..AccountPatch::default() };
        if !uow.accounts().update(account_id, patch)? {
          return abort(Indicator::NotFound);
        }
        read_back(uow.accounts().find_by_key(account_id, &())?)
      })
      .await
  }
}

/// The account called `name`, or `NOT_FOUND`.
fn account_named(uow: &mut dyn UnitOfWork, name: String) -> Work<Envelope<Account>> {
  match uow.accounts().find_by(&AccountFilter::by_name(name), &())?.pop() {
    Some(account) => commit(vec![account]),
    None => abort(Indicator::NotFound),
  }
}
