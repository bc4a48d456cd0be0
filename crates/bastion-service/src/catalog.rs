//! Substances and executors: the records tasks attach to.

use bastion_core::{
  Envelope, Indicator,
  executor::{Executor, ExecutorFilter, NewExecutor},
  store::Store,
  substance::{NewSubstance, Substance, SubstanceFilter},
};

use crate::{
  Operation, RequestContext, Service, abort_with, read_back, unless_conflict,
};

impl<S: Store> Service<S> {
  /// A name already in use yields `EXISTED` with the existing substance.
  pub async fn create_substance(
    &self,
    ctx: &RequestContext,
    name: &str,
    description: Option<&str>,
  ) -> Envelope<Substance> {
    let new = NewSubstance {
      name:        name.to_owned(),
      description: description.map(str::to_owned),
    };
    self
      .guarded(ctx, Operation::CreateSubstance, move |uow| {
        let filter = SubstanceFilter { name: Some(new.name.clone()) };
        let holders = uow.substances().find_by(&filter, &())?;
        if !holders.is_empty() {
          return abort_with(Indicator::Existed, holders);
        }
        let Some(id) = unless_conflict(uow.substances().insert(new))? else {
          return abort_with(Indicator::Existed, uow.substances().find_by(&filter, &())?);
        };
        read_back(uow.substances().find_by_key(id, &())?)
      })
      .await
  }

  /// A name already in use yields `EXISTED` with the existing executor.
  pub async fn create_executor(
    &self,
    ctx: &RequestContext,
    name: &str,
    job: Option<&str>,
  ) -> Envelope<Executor> {
    let new = NewExecutor { name: name.to_owned(), job: job.map(str::to_owned) };
    self
      .guarded(ctx, Operation::CreateExecutor, move |uow| {
        let filter = ExecutorFilter { name: Some(new.name.clone()) };
        let holders = uow.executors().find_by(&filter, &())?;
        if !holders.is_empty() {
          return abort_with(Indicator::Existed, holders);
        }
        let Some(uid) = unless_conflict(uow.executors().insert(new))? else {
          return abort_with(Indicator::Existed, uow.executors().find_by(&filter, &())?);
        };
        read_back(uow.executors().find_by_key(uid, &())?)
      })
      .await
  }
}
