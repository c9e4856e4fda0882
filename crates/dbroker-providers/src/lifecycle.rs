//! Procedures shared by every provider
//!
//! Submission, teardown and lookup are the same for all backends apart from
//! the resource kind and whether the operator leaves a dormant placeholder
//! behind, so they are free functions parameterised by both.

use crate::client::ResourceClient;
use crate::traits::ProviderContext;
use dbroker_core::error::TeardownStep;
use dbroker_core::types::{
    DynamicResource, LabelSelector, ProvisionInfo, ResourceKind, TerminationPolicy,
};
use dbroker_core::waiter::{poll_for, poll_until};
use dbroker_core::{Error, Result};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

/// What the operator leaves behind when the primary resource is deleted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeardownMode {
    /// Nothing; deleting the resource is final
    Direct,
    /// A DormantDatabase placeholder that must be wiped and deleted too
    Dormant,
}

/// Submit the resource for `info` and wait until it reports Running
pub async fn submit_and_wait<S: Serialize>(
    ctx: &ProviderContext,
    kind: ResourceKind,
    info: &ProvisionInfo,
    namespace: &str,
    spec: &S,
) -> Result<()> {
    let meta = info.to_object_meta(namespace)?;
    let resource = DynamicResource::new(kind, meta, spec)?;
    let name = info.instance_name.as_str();

    info!(
        "Creating {} {:?} in namespace {:?} (plan {})",
        kind, name, namespace, info.plan_id
    );
    ctx.client
        .create(kind, &resource)
        .await
        .map_err(|source| Error::Submission {
            kind,
            name: name.to_string(),
            source,
        })?;

    let client: &dyn ResourceClient = ctx.client.as_ref();
    poll_until(
        &ctx.readiness,
        &format!("{} {:?} to be Running", kind, name),
        move || async move {
            client
                .get(kind, namespace, name)
                .await
                .map(|r| r.is_running())
        },
    )
    .await?;

    info!("{} {:?} is Running", kind, name);
    Ok(())
}

/// Delete a backend resource, forcing an irreversible termination first.
///
/// Every step tolerates the resource already being gone, so calling this
/// again after a partial failure picks up where the last call stopped.
pub async fn teardown(
    ctx: &ProviderContext,
    kind: ResourceKind,
    name: &str,
    namespace: &str,
    mode: TeardownMode,
) -> Result<()> {
    let client: &dyn ResourceClient = ctx.client.as_ref();
    let fail = |step: TeardownStep, err: Error| Error::teardown(name, step, err);

    info!("Deleting {} {:?} from namespace {:?}", kind, name, namespace);

    match client.get(kind, namespace, name).await {
        Ok(resource) => {
            let irreversible = resource
                .termination_policy()
                .is_some_and(|p| p.is_irreversible());
            if !irreversible {
                enforce_wipe_out(ctx, kind, name, namespace)
                    .await
                    .map_err(|e| fail(TeardownStep::EnforceWipeOut, e))?;
            }
            match client.delete(kind, namespace, name).await {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(fail(TeardownStep::DeletePrimary, e.into())),
            }
        }
        Err(e) if e.is_not_found() => debug!("{} {:?} is already gone", kind, name),
        Err(e) => return Err(fail(TeardownStep::Inspect, e.into())),
    }

    if mode == TeardownMode::Direct {
        info!("Deleted {} {:?}", kind, name);
        return Ok(());
    }

    // The operator records the dormant placeholder before it releases the
    // primary, so "primary gone and no placeholder" means nothing is left.
    let dormant = poll_for(
        &ctx.teardown,
        &format!("DormantDatabase {:?} to appear", name),
        move || async move {
            match client.get(ResourceKind::DormantDatabase, namespace, name).await {
                Ok(placeholder) => Ok(Some(Some(placeholder))),
                Err(e) if e.is_not_found() => match client.get(kind, namespace, name).await {
                    Ok(_) => Ok(None),
                    Err(e) if e.is_not_found() => Ok(Some(None)),
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            }
        },
    )
    .await
    .map_err(|e| fail(TeardownStep::AwaitDormant, e))?;

    let Some(placeholder) = dormant else {
        info!("Deleted {} {:?}", kind, name);
        return Ok(());
    };

    if !placeholder.wipe_out() {
        let patch = json!({"spec": {"wipeOut": true}});
        match client
            .patch(ResourceKind::DormantDatabase, namespace, name, &patch)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(fail(TeardownStep::WipeDormant, e.into())),
        }
    }

    match client
        .delete(ResourceKind::DormantDatabase, namespace, name)
        .await
    {
        Ok(()) => {}
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(fail(TeardownStep::DeleteDormant, e.into())),
    }

    poll_until(
        &ctx.teardown,
        &format!("DormantDatabase {:?} to be removed", name),
        move || async move {
            match client.get(ResourceKind::DormantDatabase, namespace, name).await {
                Ok(_) => Ok(false),
                Err(e) if e.is_not_found() => Ok(true),
                Err(e) => Err(e),
            }
        },
    )
    .await
    .map_err(|e| fail(TeardownStep::AwaitRemoval, e))?;

    info!("Deleted {} {:?} and its dormant database", kind, name);
    Ok(())
}

async fn enforce_wipe_out(
    ctx: &ProviderContext,
    kind: ResourceKind,
    name: &str,
    namespace: &str,
) -> Result<()> {
    let client: &dyn ResourceClient = ctx.client.as_ref();
    let patch = json!({"spec": {"terminationPolicy": TerminationPolicy::WipeOut}});

    debug!("Setting terminationPolicy=WipeOut on {} {:?}", kind, name);
    match client.patch(kind, namespace, name, &patch).await {
        Ok(_) => {}
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e.into()),
    }

    poll_until(
        &ctx.teardown,
        &format!("{} {:?} to observe terminationPolicy WipeOut", kind, name),
        move || async move {
            match client.get(kind, namespace, name).await {
                Ok(r) => Ok(r.termination_policy() == Some(TerminationPolicy::WipeOut)),
                Err(e) if e.is_not_found() => Ok(true),
                Err(e) => Err(e),
            }
        },
    )
    .await
}

/// Find the provisioning record stored on the resource labelled `instance_id`
pub async fn lookup_provision_info(
    ctx: &ProviderContext,
    kind: ResourceKind,
    instance_id: &str,
    namespace: &str,
) -> Result<Option<ProvisionInfo>> {
    let selector = LabelSelector::instance(instance_id);
    let mut matches = ctx.client.list(kind, namespace, &selector).await?;
    matches.retain(|r| r.instance_id() == Some(instance_id));

    match matches.len() {
        0 => Ok(None),
        1 => {
            let resource = matches.remove(0);
            ProvisionInfo::from_object_meta(&resource.metadata).map(Some)
        }
        n => {
            warn!(
                "{} resources of kind {} carry instance id {}",
                n, kind, instance_id
            );
            Err(Error::InconsistentState {
                instance_id: instance_id.to_string(),
                matches: n,
            })
        }
    }
}
