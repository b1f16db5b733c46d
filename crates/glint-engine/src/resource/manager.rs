use std::collections::HashMap;

use super::{LoadParams, Release, Resource, ResourceData, ResourceError, ResourceKind, ResourceLoader};

/// Uri-keyed resource cache backed by an ordered list of loaders.
pub struct ResourceManager<D: Release = ResourceData> {
    loaders: Vec<Box<dyn ResourceLoader<D>>>,
    resources: HashMap<String, Resource<D>>,
}

impl<D: Release> ResourceManager<D> {
    pub fn new() -> Self {
        Self {
            loaders: Vec::new(),
            resources: HashMap::new(),
        }
    }

    /// Appends a loader. Earlier loaders take precedence.
    pub fn add_loader(&mut self, loader: impl ResourceLoader<D> + 'static) -> &mut Self {
        self.loaders.push(Box::new(loader));
        self
    }

    pub fn loader_count(&self) -> usize {
        self.loaders.len()
    }

    /// First registered loader accepting the request.
    pub fn get_loader(
        &self,
        kind: ResourceKind,
        uri: &str,
        params: &LoadParams,
    ) -> Result<&dyn ResourceLoader<D>, ResourceError> {
        self.loaders
            .iter()
            .find(|loader| loader.can_load(kind, uri, params))
            .map(|loader| &**loader)
            .ok_or_else(|| ResourceError::NoLoader {
                kind,
                uri: uri.to_string(),
                params: params.to_string(),
            })
    }

    /// Loads and caches `uri`.
    ///
    /// A failed load is logged and cached as an empty resource. A request no
    /// loader accepts is a setup error and panics.
    pub fn preload(
        &mut self,
        kind: ResourceKind,
        uri: &str,
        params: impl Into<LoadParams>,
    ) -> &mut Self {
        let params = params.into();

        let loaded = match self.get_loader(kind, uri, &params) {
            Ok(loader) => loader.load(uri, &params),
            Err(err) => {
                log::error!("{err}");
                panic!("ResourceManager::preload: {err}");
            }
        };

        let resource = match loaded {
            Ok(data) => {
                log::info!("loaded {kind} '{uri}' from {params}");
                Resource::new(kind, uri, data)
            }
            Err(err) => {
                log::warn!("failed to load {kind} '{uri}' from {params}: {err}");
                log::warn!("caching empty {kind} '{uri}'");
                Resource::empty(kind, uri)
            }
        };

        self.insert(resource);
        self
    }

    /// Cached resource for `uri`.
    ///
    /// Panics when `uri` was never preloaded or inserted.
    pub fn get(&self, uri: &str) -> &Resource<D> {
        match self.resources.get(uri) {
            Some(resource) => resource,
            None => {
                log::error!("resource '{uri}' requested before it was preloaded");
                panic!("ResourceManager::get: resource '{uri}' not found");
            }
        }
    }

    pub fn try_get(&self, uri: &str) -> Option<&Resource<D>> {
        self.resources.get(uri)
    }

    pub fn contains(&self, uri: &str) -> bool {
        self.resources.contains_key(uri)
    }

    /// Caches `resource`, releasing whatever was stored under its uri.
    pub fn insert(&mut self, resource: Resource<D>) {
        if let Some(mut old) = self.resources.remove(&resource.uri) {
            log::debug!("replacing {} '{}'", old.kind, old.uri);
            old.release();
        }
        self.resources.insert(resource.uri.clone(), resource);
    }

    /// Releases every cached resource and empties the cache.
    pub fn unload(&mut self) {
        let count = self.resources.len();
        for (_, mut resource) in self.resources.drain() {
            resource.release();
        }
        log::debug!("unloaded {count} resources");
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl<D: Release> Default for ResourceManager<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::path::PathBuf;
    use std::rc::Rc;

    use super::*;
    use crate::resource::{LoadError, ProceduralMesh, TextureParams};

    /// Payload that counts how often it was released.
    struct Payload {
        tag: &'static str,
        released: Rc<Cell<u32>>,
    }

    impl Release for Payload {
        fn release(self) {
            self.released.set(self.released.get() + 1);
        }
    }

    struct TagLoader {
        kind: ResourceKind,
        tag: &'static str,
        fail: bool,
        released: Rc<Cell<u32>>,
    }

    impl ResourceLoader<Payload> for TagLoader {
        fn can_load(&self, kind: ResourceKind, _uri: &str, _params: &LoadParams) -> bool {
            kind == self.kind
        }

        fn load(&self, uri: &str, _params: &LoadParams) -> Result<Payload, LoadError> {
            if self.fail {
                return Err(LoadError::InvalidGeometry(format!("cannot build {uri}")));
            }
            Ok(Payload {
                tag: self.tag,
                released: self.released.clone(),
            })
        }
    }

    fn loader(kind: ResourceKind, tag: &'static str, fail: bool, released: &Rc<Cell<u32>>) -> TagLoader {
        TagLoader {
            kind,
            tag,
            fail,
            released: released.clone(),
        }
    }

    fn quad() -> LoadParams {
        ProceduralMesh::Quad.into()
    }

    #[test]
    fn first_matching_loader_wins() {
        let released = Rc::new(Cell::new(0));
        let mut manager: ResourceManager<Payload> = ResourceManager::new();
        manager
            .add_loader(loader(ResourceKind::Texture, "texture", false, &released))
            .add_loader(loader(ResourceKind::Mesh, "first", false, &released))
            .add_loader(loader(ResourceKind::Mesh, "second", false, &released));

        manager.preload(ResourceKind::Mesh, "quad", quad());

        let resource = manager.get("quad");
        assert_eq!(resource.uri, "quad");
        assert_eq!(resource.kind, ResourceKind::Mesh);
        assert_eq!(resource.data.as_ref().map(|p| p.tag), Some("first"));
    }

    #[test]
    fn get_loader_reports_missing_loader() {
        let manager: ResourceManager<Payload> = ResourceManager::new();
        let err = match manager.get_loader(ResourceKind::Shader, "s", &quad()) {
            Err(err) => err,
            Ok(_) => panic!("expected no loader"),
        };
        assert!(matches!(err, ResourceError::NoLoader { kind: ResourceKind::Shader, .. }));
    }

    #[test]
    fn failed_load_caches_empty_placeholder() {
        let released = Rc::new(Cell::new(0));
        let mut manager: ResourceManager<Payload> = ResourceManager::new();
        manager.add_loader(loader(ResourceKind::Texture, "t", true, &released));

        let params = TextureParams {
            path: PathBuf::from("missing.png"),
            nearest_filtering: false,
        };
        manager.preload(ResourceKind::Texture, "missing", params);

        assert!(manager.contains("missing"));
        assert!(manager.get("missing").is_empty());
        assert_eq!(manager.len(), 1);
    }

    #[test]
    #[should_panic(expected = "no resource loader")]
    fn preload_without_loader_panics() {
        let mut manager: ResourceManager<Payload> = ResourceManager::new();
        manager.preload(ResourceKind::Mesh, "quad", quad());
    }

    #[test]
    #[should_panic(expected = "not found")]
    fn get_unknown_uri_panics() {
        let manager: ResourceManager<Payload> = ResourceManager::new();
        manager.get("nope");
    }

    #[test]
    fn insert_releases_replaced_payload() {
        let released = Rc::new(Cell::new(0));
        let mut manager: ResourceManager<Payload> = ResourceManager::new();
        manager.add_loader(loader(ResourceKind::Mesh, "m", false, &released));
        manager.preload(ResourceKind::Mesh, "circle", quad());

        manager.insert(Resource::new(
            ResourceKind::Mesh,
            "circle",
            Payload {
                tag: "replacement",
                released: released.clone(),
            },
        ));

        assert_eq!(released.get(), 1);
        assert_eq!(manager.get("circle").data.as_ref().map(|p| p.tag), Some("replacement"));
        assert!(manager.try_get("other").is_none());
    }

    #[test]
    fn unload_releases_each_payload_once() {
        let released = Rc::new(Cell::new(0));
        let mut manager: ResourceManager<Payload> = ResourceManager::new();
        manager
            .add_loader(loader(ResourceKind::Mesh, "m", false, &released))
            .add_loader(loader(ResourceKind::Texture, "t", true, &released));

        manager
            .preload(ResourceKind::Mesh, "a", quad())
            .preload(ResourceKind::Mesh, "b", quad())
            .preload(
                ResourceKind::Texture,
                "broken",
                TextureParams {
                    path: PathBuf::from("broken.png"),
                    nearest_filtering: true,
                },
            );

        manager.unload();
        assert_eq!(released.get(), 2);
        assert!(manager.is_empty());

        manager.unload();
        assert_eq!(released.get(), 2);
    }
}
