use serde::Deserialize;
use serde::Serialize;

use crate::ConfigError;

pub const KUBECONFIG_API_VERSION: &str = "v1";
pub const KUBECONFIG_KIND: &str = "Config";

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub name: String,
    pub cluster: ClusterDetail,
}

#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ClusterDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certificate_authority_data: Option<String>,
    pub server: String,
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct Context {
    pub name: String,
    pub context: ContextDetail,
}

#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct ContextDetail {
    pub cluster: String,
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
pub struct User {
    pub name: String,
    pub user: UserDetail,
}

#[derive(Debug, Eq, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserDetail {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_certificate_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_key_data: Option<String>,
}

/// kubeconfig document with embedded credentials
#[derive(Debug, Eq, PartialEq, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct KubeConfig {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub clusters: Vec<Cluster>,
    pub contexts: Vec<Context>,
    pub current_context: String,
    pub kind: String,
    pub users: Vec<User>,
}

impl Default for KubeConfig {
    fn default() -> Self {
        Self {
            api_version: KUBECONFIG_API_VERSION.to_owned(),
            clusters: vec![],
            contexts: vec![],
            current_context: String::new(),
            kind: KUBECONFIG_KIND.to_owned(),
            users: vec![],
        }
    }
}

impl KubeConfig {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_slice(bytes)?)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(serde_yaml::to_string(self)?.into_bytes())
    }

    pub fn current_context(&self) -> Option<&Context> {
        self.contexts
            .iter()
            .find(|c| c.name == self.current_context)
    }

    pub fn current_cluster(&self) -> Option<&Cluster> {
        if let Some(ctx) = self.current_context() {
            self.clusters.iter().find(|c| c.name == ctx.context.cluster)
        } else {
            None
        }
    }

    pub fn current_user(&self) -> Option<&User> {
        if let Some(ctx) = self.current_context() {
            self.users.iter().find(|c| c.name == ctx.context.user)
        } else {
            None
        }
    }

    pub fn put_user(&mut self, user: User) -> Option<User> {
        let prev = self.users.iter_mut().find(|u| u.name.eq(&user.name));
        match prev {
            Some(prev) => Some(std::mem::replace(prev, user)),
            None => {
                self.users.push(user);
                None
            }
        }
    }

    pub fn put_cluster(&mut self, cluster: Cluster) -> Option<Cluster> {
        let prev = self.clusters.iter_mut().find(|c| c.name.eq(&cluster.name));
        match prev {
            Some(prev) => Some(std::mem::replace(prev, cluster)),
            None => {
                self.clusters.push(cluster);
                None
            }
        }
    }

    pub fn put_context(&mut self, context: Context) -> Option<Context> {
        let prev = self.contexts.iter_mut().find(|c| c.name.eq(&context.name));
        match prev {
            Some(prev) => Some(std::mem::replace(prev, context)),
            None => {
                self.contexts.push(context);
                None
            }
        }
    }
}

#[cfg(test)]
mod test {

    use crate::{Cluster, ClusterDetail, Context, ContextDetail, User, UserDetail};

    use super::KubeConfig;

    const ADMIN_CONF: &str = r#"apiVersion: v1
clusters:
- name: tenant-a
  cluster:
    certificate-authority-data: Q0E=
    server: https://10.0.0.10:6443
contexts:
- name: kubernetes-admin@tenant-a
  context:
    cluster: tenant-a
    user: kubernetes-admin
current-context: kubernetes-admin@tenant-a
kind: Config
users:
- name: kubernetes-admin
  user:
    client-certificate-data: Q0VSVA==
    client-key-data: S0VZ
"#;

    #[test]
    fn test_decode_config() {
        let config = KubeConfig::from_slice(ADMIN_CONF.as_bytes()).expect("read");
        assert_eq!(config.api_version, "v1");
        assert_eq!(config.kind, "Config");
        assert_eq!(config.current_context, "kubernetes-admin@tenant-a");

        let cluster = config.current_cluster().expect("cluster");
        assert_eq!(cluster.cluster.server, "https://10.0.0.10:6443");
        assert_eq!(
            cluster.cluster.certificate_authority_data.as_deref(),
            Some("Q0E=")
        );

        let user = config.current_user().expect("user");
        assert_eq!(user.name, "kubernetes-admin");
        assert_eq!(user.user.client_key_data.as_deref(), Some("S0VZ"));
    }

    #[test]
    fn test_config_ser() {
        //given
        let mut config = KubeConfig::default();
        config.put_cluster(Cluster {
            name: "tenant-a".to_owned(),
            cluster: ClusterDetail {
                certificate_authority_data: Some("Q0E=".to_owned()),
                server: "https://10.0.0.10:6443".to_owned(),
            },
        });
        config.put_context(Context {
            name: "kubernetes-admin@tenant-a".to_owned(),
            context: ContextDetail {
                cluster: "tenant-a".to_owned(),
                user: "kubernetes-admin".to_owned(),
                namespace: None,
            },
        });
        config.put_user(User {
            name: "kubernetes-admin".to_owned(),
            user: UserDetail {
                client_certificate_data: Some("Q0VSVA==".to_owned()),
                client_key_data: Some("S0VZ".to_owned()),
            },
        });
        config.current_context = "kubernetes-admin@tenant-a".to_owned();

        //when
        let serialized = String::from_utf8(config.to_bytes().expect("serialize")).expect("utf8");

        //then
        assert_eq!(serialized, ADMIN_CONF);
    }

    #[test]
    fn test_missing_current_context() {
        let mut config = KubeConfig::from_slice(ADMIN_CONF.as_bytes()).expect("read");
        config.current_context = "unknown".to_owned();
        assert!(config.current_cluster().is_none());
        assert!(config.current_user().is_none());
    }

    #[test]
    fn test_put_user_replaces_credentials() {
        //given
        let mut config = KubeConfig::from_slice(ADMIN_CONF.as_bytes()).expect("read");
        let rotated = User {
            name: "kubernetes-admin".to_owned(),
            user: UserDetail {
                client_certificate_data: Some("Q0VSVDI=".to_owned()),
                client_key_data: Some("S0VZMg==".to_owned()),
            },
        };

        //when
        let prev = config.put_user(rotated).expect("previous user");

        //then
        assert_eq!(prev.user.client_certificate_data.as_deref(), Some("Q0VSVA=="));
        assert_eq!(config.users.len(), 1);
        let user = config.current_user().expect("user");
        assert_eq!(user.user.client_certificate_data.as_deref(), Some("Q0VSVDI="));
        assert_eq!(user.user.client_key_data.as_deref(), Some("S0VZMg=="));

        assert!(config
            .put_user(User {
                name: "system:kube-scheduler".to_owned(),
                user: UserDetail::default(),
            })
            .is_none());
        assert_eq!(config.users.len(), 2);
    }

    #[test]
    fn test_malformed_document() {
        assert!(KubeConfig::from_slice(b"clusters: [").is_err());
    }
}
